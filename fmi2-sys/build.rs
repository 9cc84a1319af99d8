fn main() {
    cc::Build::new().file("src/logger.c").compile("logger");
    println!("cargo:rerun-if-changed=src/logger.c");
}
