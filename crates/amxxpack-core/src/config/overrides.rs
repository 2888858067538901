//! Partial project configuration as written by the user.
//!
//! Every field distinguishes "absent" from "explicitly null": an absent key
//! inherits the built-in default, `null` disables the stage it configures.

use serde::{Deserialize, Deserializer};

/// Three-state override of a single configuration field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Override<T> {
    /// Key absent: use the built-in default
    #[default]
    Inherit,
    /// Key explicitly `null`
    Disable,
    /// Key set to a value
    Set(T),
}

impl<T> Override<T> {
    pub fn set(value: impl Into<T>) -> Self {
        Override::Set(value.into())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Override<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only reached when the key is present; absent keys go through `Default`
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Override::Set(value),
            None => Override::Disable,
        })
    }
}

/// A scalar or a list of scalars
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

/// Asset input as written: a bare directory or a `{dir, dest, filter}` object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AssetInputSpec {
    Dir(String),
    Detailed {
        dir: String,
        #[serde(default)]
        dest: Option<String>,
        #[serde(default)]
        filter: Option<OneOrMany<String>>,
    },
}

impl From<&str> for AssetInputSpec {
    fn from(dir: &str) -> Self {
        AssetInputSpec::Dir(dir.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputOverrides {
    pub scripts: Override<OneOrMany<String>>,
    pub include: Override<OneOrMany<String>>,
    pub assets: Override<OneOrMany<AssetInputSpec>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputOverrides {
    pub base: Override<String>,
    pub scripts: Override<String>,
    pub plugins: Override<String>,
    pub include: Override<String>,
    pub assets: Override<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompilerOverrides {
    pub dir: Override<String>,
    pub version: Option<String>,
    pub dev: Option<bool>,
    pub addons: Option<Vec<String>>,
    pub executable: Option<String>,
}

/// Third-party archive declared by the project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub strip: Option<u32>,
    #[serde(default)]
    pub filter: Option<OneOrMany<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThirdpartyOverrides {
    pub dir: Override<String>,
    pub dependencies: Option<Vec<Dependency>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulesOverrides {
    pub flat_compilation: Option<bool>,
}

/// User-supplied project configuration, before defaults are applied
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectOverrides {
    pub input: InputOverrides,
    pub output: OutputOverrides,
    pub compiler: CompilerOverrides,
    pub thirdparty: ThirdpartyOverrides,
    pub include: Override<Vec<String>>,
    pub rules: RulesOverrides,
}
