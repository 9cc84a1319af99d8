//! Runs the simulation and assembles the CSV output.

use std::path::PathBuf;

use itertools::Itertools;

use fmi2::instance::traits::{Common, Slave};
use fmi2::model_description::{ModelDescription, ScalarVariable, ScalarVariableElement};
use fmi2::{Euler, Fmu};

use crate::options::DriverOptions;

const MAX_OUTPUT_BYTES: usize = 1_000_000;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The simulation could not be carried to the stop time.
    #[error("{0}")]
    Failure(String),

    /// The run violated a driver constraint.
    #[error("{0}")]
    Rejection(String),

    #[error(transparent)]
    Fmu(#[from] fmi2::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarKind {
    Real,
    Integer,
    Boolean,
    String,
}

/// A variable selected for recording.
#[derive(Debug)]
struct Recorded {
    name: String,
    vr: u32,
    kind: VarKind,
}

impl From<&ScalarVariable> for Recorded {
    fn from(var: &ScalarVariable) -> Self {
        let kind = match &var.elem {
            ScalarVariableElement::Real(_) => VarKind::Real,
            ScalarVariableElement::Integer(_) | ScalarVariableElement::Enumeration(_) => {
                VarKind::Integer
            }
            ScalarVariableElement::Boolean(_) => VarKind::Boolean,
            ScalarVariableElement::String(_) => VarKind::String,
        };
        Self {
            name: var.name.clone(),
            vr: var.value_reference,
            kind,
        }
    }
}

fn resolve_variables(
    descr: &ModelDescription,
    names: &[String],
) -> Result<Vec<Recorded>, DriverError> {
    if names.is_empty() {
        return Ok(descr.outputs().map(Recorded::from).collect());
    }
    names
        .iter()
        .map(|name| {
            descr
                .model_variable_by_name(name)
                .map(Recorded::from)
                .map_err(DriverError::Fmu)
        })
        .collect()
}

fn csv_header(variables: &[Recorded]) -> String {
    std::iter::once("\"Time\"".to_owned())
        .chain(variables.iter().map(|v| format!("\"{}\"", v.name)))
        .join(",")
}

fn append_row(
    slave: &mut dyn Slave,
    variables: &[Recorded],
    data: &mut String,
) -> Result<(), DriverError> {
    data.push('\n');
    data.push_str(&slave.simulation_time().to_string());
    for var in variables {
        data.push(',');
        let cell = match var.kind {
            VarKind::Real => slave.read_real(var.vr)?.to_string(),
            VarKind::Integer => slave.read_integer(var.vr)?.to_string(),
            VarKind::Boolean => (slave.read_boolean(var.vr)? as i32).to_string(),
            VarKind::String => slave.read_string(var.vr)?,
        };
        data.push_str(&cell);
    }
    Ok(())
}

fn simulate(
    slave: &mut dyn Slave,
    variables: &[Recorded],
    start_time: f64,
    stop_time: f64,
    step_size: f64,
) -> Result<String, DriverError> {
    slave.setup_experiment(start_time, Some(stop_time), None)?;
    slave.enter_initialization_mode()?;
    slave.exit_initialization_mode()?;

    let mut data = csv_header(variables);
    append_row(slave, variables, &mut data)?;

    while slave.simulation_time() < stop_time {
        if let Err(err) = slave.do_step(step_size) {
            let _ = slave.terminate();
            return Err(DriverError::Failure(format!(
                "simulation terminated prematurely at t = {}: {err}",
                slave.simulation_time()
            )));
        }
        append_row(slave, variables, &mut data)?;
    }

    slave.terminate()?;
    Ok(data)
}

/// Open the FMU named by `options`, run it and write the CSV next to the
/// requested output directory. Returns the path of the written file.
pub fn run(options: &DriverOptions) -> Result<PathBuf, DriverError> {
    let fmu = Fmu::open(&options.model)?;
    let descr = fmu.model_description().clone();

    let default_experiment = descr.default_experiment.clone().unwrap_or_default();
    let start_time = options
        .start_time
        .or(default_experiment.start_time)
        .unwrap_or(0.0);
    let stop_time = options
        .stop_time
        .or(default_experiment.stop_time)
        .unwrap_or(1.0);
    let step_size = options
        .step_size
        .or(default_experiment.step_size)
        .unwrap_or(1e-3);
    if step_size <= 0.0 {
        return Err(DriverError::Rejection(format!(
            "step size must be positive, got {step_size}"
        )));
    }

    let variables = resolve_variables(&descr, &options.variables)?;
    log::info!(
        "Simulating `{}` from {start_time} to {stop_time} with h = {step_size}, recording {} variables",
        descr.model_name,
        variables.len()
    );

    let mut slave: Box<dyn Slave> = if options.model_exchange {
        let solver = Box::new(Euler::new(options.solver_step));
        Box::new(
            fmu.as_model_exchange()?
                .new_slave(solver, false, options.logging_on)?,
        )
    } else {
        Box::new(fmu.as_co_simulation()?.new_instance(false, options.logging_on)?)
    };

    let data = simulate(slave.as_mut(), &variables, start_time, stop_time, step_size)?;

    if options.fail_on_large_output && data.len() > MAX_OUTPUT_BYTES {
        return Err(DriverError::Rejection(format!(
            "generated CSV exceeds {MAX_OUTPUT_BYTES} bytes: was {}",
            data.len()
        )));
    }

    let stem = options
        .model
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_owned());
    std::fs::create_dir_all(&options.output_dir)?;
    let output_file = options.output_dir.join(format!("{stem}_out.csv"));
    std::fs::write(&output_file, data)?;
    Ok(output_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(name: &str, vr: u32, kind: VarKind) -> Recorded {
        Recorded {
            name: name.to_owned(),
            vr,
            kind,
        }
    }

    #[test]
    fn test_csv_header_quotes_names() {
        let vars = [
            recorded("MotorDiskRev", 105, VarKind::Real),
            recorded("OnOff", 30, VarKind::Boolean),
        ];
        assert_eq!(csv_header(&vars), r#""Time","MotorDiskRev","OnOff""#);
    }

    #[test]
    fn test_csv_header_without_variables() {
        assert_eq!(csv_header(&[]), r#""Time""#);
    }

    #[test]
    fn test_variable_kind_mapping() {
        use fmi2::schema::{BooleanElement, EnumerationElement};

        let mut var = ScalarVariable {
            name: "flag".to_owned(),
            value_reference: 7,
            elem: ScalarVariableElement::Boolean(BooleanElement::default()),
            ..Default::default()
        };
        assert_eq!(Recorded::from(&var).kind, VarKind::Boolean);

        var.elem = ScalarVariableElement::Enumeration(EnumerationElement::default());
        assert_eq!(Recorded::from(&var).kind, VarKind::Integer);
    }
}
