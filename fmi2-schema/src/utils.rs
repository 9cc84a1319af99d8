use std::{fmt::Display, str::FromStr};

/// A whitespace-separated attribute list, as used by the `dependencies` and
/// `dependenciesKind` attributes of `<Unknown>`.
pub(crate) struct AttrList<T>(pub Vec<T>);

impl<T> FromStr for AttrList<T>
where
    T: FromStr,
    T::Err: Display,
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(|token| token.parse::<T>().map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map(AttrList)
    }
}

impl<T: Display> Display for AttrList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_list() {
        let list: AttrList<u32> = "1 5 12".parse().unwrap();
        assert_eq!(list.0, vec![1, 5, 12]);
        assert_eq!(list.to_string(), "1 5 12");
        assert!("1 x".parse::<AttrList<u32>>().is_err());
    }
}
