use serde::{Deserialize, Serialize};

/// Splits one identifier column into named components by position.
///
/// `expected` is the minimum number of `delimiter`-separated components a
/// well-formed value carries; each target picks one component by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSplit {
    pub column: String,
    pub delimiter: String,
    pub expected: usize,
    pub targets: Vec<SplitTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTarget {
    pub index: usize,
    pub name: String,
}

impl IdentifierSplit {
    pub fn new(column: &str, delimiter: &str, expected: usize, names: &[(usize, &str)]) -> Self {
        Self {
            column: column.to_string(),
            delimiter: delimiter.to_string(),
            expected,
            targets: names
                .iter()
                .map(|&(index, name)| SplitTarget {
                    index,
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.delimiter.is_empty() {
            return Err(format!("split of '{}' has an empty delimiter", self.column));
        }
        if self.expected == 0 {
            return Err(format!(
                "split of '{}' expects zero components",
                self.column
            ));
        }
        for target in &self.targets {
            if target.index >= self.expected {
                return Err(format!(
                    "split of '{}' targets component {} of {}",
                    self.column, target.index, self.expected
                ));
            }
        }
        Ok(())
    }
}
