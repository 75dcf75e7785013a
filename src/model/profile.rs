use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::identifiers::IdentifierSplit;
use crate::model::policy::{AccuracyPolicy, MalformedPolicy};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("cannot read profile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid profile {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid profile: {0}")]
    Invalid(String),
}

/// First rule whose marker occurs in the model name assigns the family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRule {
    pub marker: String,
    pub family: String,
}

/// Substring rewrite applied to model names to merge versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRewrite {
    pub pattern: String,
    pub replacement: String,
}

/// Fixed horizontal offset for models whose name contains `marker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOffset {
    pub marker: String,
    pub offset: f64,
}

/// Per-dataset derivation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetProfile {
    pub name: String,
    pub splits: Vec<IdentifierSplit>,
    pub on_malformed: MalformedPolicy,
    pub accuracy_policy: AccuracyPolicy,
}

impl Default for DatasetProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            splits: vec![model_split()],
            on_malformed: MalformedPolicy::Abort,
            accuracy_policy: AccuracyPolicy::SummedScores,
        }
    }
}

/// `model` is the part of `model_name` before the first `:`.
fn model_split() -> IdentifierSplit {
    IdentifierSplit::new("model_name", ":", 1, &[(0, "model")])
}

/// Orderings and naming data that drive the figures. Every field has a
/// built-in value; a JSON override file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotProfile {
    pub benchmarked_models: Vec<String>,
    pub model_size_order: Vec<String>,
    pub quantisation_order: Vec<String>,
    pub closed_model_quantisation: String,
    pub closed_model_markers: Vec<String>,
    pub model_families: Vec<FamilyRule>,
    pub fallback_family: String,
    pub family_order: Vec<String>,
    pub coarse_model_names: Vec<NameRewrite>,
    pub scatter_offsets: Vec<ModelOffset>,
    pub scatter_unjittered: Vec<String>,
    pub scatter_closed_markers: Vec<String>,
    pub jitter_width: f64,
    pub overview_id_columns: Vec<String>,
    pub task_display_names: BTreeMap<String, String>,
    pub datasets: Vec<DatasetProfile>,
}

impl Default for PlotProfile {
    fn default() -> Self {
        Self::builtin()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl PlotProfile {
    pub fn builtin() -> Self {
        Self {
            benchmarked_models: strings(&[
                "chatglm3",
                "claude-3-5-sonnet-20240620",
                "claude-3-opus-20240229",
                "code-llama-instruct",
                "gpt-3.5-turbo-0613",
                "gpt-3.5-turbo-0125",
                "gpt-4-0613",
                "gpt-4-0125-preview",
                "gpt-4-1106-preview",
                "gpt-4-turbo-2024-04-09",
                "gpt-4o-2024-05-13",
                "gpt-4o-2024-08-06",
                "gpt-4o-2024-11-20",
                "gpt-4o-mini-2024-07-18",
                "llama-2-chat",
                "llama-3-instruct",
                "llama-3.1-instruct",
                "mixtral-instruct-v0.1",
                "mistral-instruct-v0.2",
                "openhermes-2.5",
            ]),
            model_size_order: strings(&[
                "Unknown", "175", "70", "46,7", "34", "13", "8", "7", "6",
            ]),
            quantisation_order: strings(&[
                "2-bit",
                "3-bit",
                "4-bit",
                "5-bit",
                "6-bit",
                "8-bit",
                ">= 16-bit*",
            ]),
            closed_model_quantisation: ">= 16-bit*".to_string(),
            closed_model_markers: strings(&["gpt-3.5-turbo", "gpt-4", "claude"]),
            model_families: vec![
                FamilyRule {
                    marker: "openhermes".to_string(),
                    family: "openhermes".to_string(),
                },
                FamilyRule {
                    marker: "llama-3".to_string(),
                    family: "llama-3".to_string(),
                },
                FamilyRule {
                    marker: "gpt".to_string(),
                    family: "gpt".to_string(),
                },
            ],
            fallback_family: "other open source".to_string(),
            family_order: strings(&["other open source", "llama-3", "openhermes", "gpt"]),
            coarse_model_names: [
                ("gpt-3.5-turbo-0613", "gpt-3.5-turbo"),
                ("gpt-3.5-turbo-0125", "gpt-3.5-turbo"),
                ("gpt-4-0613", "gpt-4"),
                ("gpt-4-0125-preview", "gpt-4"),
                ("gpt-4o-2024-05-13", "gpt-4"),
                ("gpt-4o-2024-08-06", "gpt-4"),
            ]
            .iter()
            .map(|&(pattern, replacement)| NameRewrite {
                pattern: pattern.to_string(),
                replacement: replacement.to_string(),
            })
            .collect(),
            scatter_offsets: [
                ("gpt-3", -0.2),
                ("gpt-4", 0.2),
                ("claude-3-opus-20240229", -0.05),
                ("claude-3-5-sonnet-20240620", 0.05),
            ]
            .iter()
            .map(|&(marker, offset)| ModelOffset {
                marker: marker.to_string(),
                offset,
            })
            .collect(),
            scatter_unjittered: strings(&["openhermes-2.5"]),
            scatter_closed_markers: strings(&["gpt", "claude"]),
            jitter_width: 0.2,
            overview_id_columns: strings(&[
                "Full model name",
                "Model name",
                "Size",
                "Version",
                "Quantisation",
                "Mean Accuracy",
                "Median Accuracy",
                "SD",
            ]),
            task_display_names: [
                ("query_generation", "BioChatter"),
                (
                    "naive_query_generation_using_schema",
                    "Naive LLM (using full YAML schema)",
                ),
            ]
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            datasets: vec![
                DatasetProfile {
                    name: "medical_exam".to_string(),
                    splits: vec![
                        model_split(),
                        IdentifierSplit::new(
                            "subtask",
                            ":",
                            3,
                            &[(0, "task"), (1, "domain"), (2, "language")],
                        ),
                    ],
                    on_malformed: MalformedPolicy::Abort,
                    accuracy_policy: AccuracyPolicy::MeanOfRatios,
                },
                DatasetProfile {
                    name: "sourcedata_info_extraction".to_string(),
                    splits: vec![
                        model_split(),
                        IdentifierSplit::new("subtask", ":", 2, &[(1, "subtask")]),
                    ],
                    on_malformed: MalformedPolicy::Abort,
                    accuracy_policy: AccuracyPolicy::SummedScores,
                },
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let profile = Self::from_json(&text).map_err(|source| ProfileError::Json {
            path: path.display().to_string(),
            source,
        })?;
        profile.validate()?;
        tracing::info!(path = %path.display(), "loaded plot profile");
        Ok(profile)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        for dataset in &self.datasets {
            if dataset.name.is_empty() {
                return Err(ProfileError::Invalid("dataset with empty name".to_string()));
            }
            for split in &dataset.splits {
                split
                    .validate()
                    .map_err(|msg| ProfileError::Invalid(format!("{}: {msg}", dataset.name)))?;
            }
        }
        if !(self.jitter_width >= 0.0 && self.jitter_width < 0.5) {
            return Err(ProfileError::Invalid(format!(
                "jitter_width {} outside [0, 0.5)",
                self.jitter_width
            )));
        }
        Ok(())
    }

    /// Rules for `name`, or the default model-only split.
    pub fn dataset(&self, name: &str) -> DatasetProfile {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .unwrap_or_else(|| DatasetProfile {
                name: name.to_string(),
                ..DatasetProfile::default()
            })
    }

    pub fn model_family(&self, model: &str) -> String {
        self.model_families
            .iter()
            .find(|rule| model.contains(rule.marker.as_str()))
            .map(|rule| rule.family.clone())
            .unwrap_or_else(|| self.fallback_family.clone())
    }

    pub fn is_closed_model(&self, model_name: &str) -> bool {
        self.closed_model_markers
            .iter()
            .any(|m| model_name.contains(m.as_str()))
    }

    pub fn coarse_model_name(&self, model_name: &str) -> String {
        let mut name = model_name.to_string();
        for rewrite in &self.coarse_model_names {
            if name.contains(rewrite.pattern.as_str()) {
                name = name.replace(rewrite.pattern.as_str(), &rewrite.replacement);
            }
        }
        name
    }

    pub fn task_display_name<'a>(&'a self, task: &'a str) -> &'a str {
        self.task_display_names
            .get(task)
            .map(String::as_str)
            .unwrap_or(task)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/profile.rs"]
mod tests;
