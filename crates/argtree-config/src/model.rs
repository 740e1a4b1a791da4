//! Serde model of task definition files

use argtree_core::{ParamValidator, PathRole, SwitchFormat};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// One command-line task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task name
    pub name: String,

    /// Human-readable summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tree-wide switch format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_format: Option<SwitchFormat>,

    /// Declared job parameters
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,

    /// Named converters, referenced with `{ ref: name }`
    #[serde(default)]
    pub converters: IndexMap<String, ConverterDef>,

    /// Root converter
    pub command: ConverterDef,
}

/// Declared job parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Parameter name
    pub name: String,

    /// Value type
    #[serde(rename = "type", default)]
    pub kind: ParamType,

    /// Allowed values of a `choice`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Default applied to converters reading this parameter
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,

    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ParameterDef {
    /// Validator implied by the declared type
    #[must_use]
    pub fn validator(&self) -> Option<ParamValidator> {
        match self.kind {
            ParamType::Text => None,
            ParamType::Int => Some(ParamValidator::Integer),
            ParamType::Double => Some(ParamValidator::Decimal),
            ParamType::Boolean => Some(ParamValidator::YesNo),
            ParamType::Choice => Some(ParamValidator::OneOf(self.options.clone())),
        }
    }
}

/// Declared parameter type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Free text
    #[default]
    Text,
    /// Integer
    Int,
    /// Decimal number
    Double,
    /// `yes` / `no`
    Boolean,
    /// One of `options`
    Choice,
}

/// Converter definition
///
/// A bare string is a literal; `{ ref: name }` points at a named converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConverterDef {
    /// Literal token
    Literal(String),

    /// Reference to a named converter
    Ref {
        /// Converter name
        #[serde(rename = "ref")]
        name: String,
    },

    /// Inline node
    Node(Box<NodeDef>),
}

impl ConverterDef {
    /// Reference a named converter
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref { name: name.into() }
    }
}

/// Inline converter node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Explicit switch format; inherited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SwitchFormat>,

    /// Node kind and its fields
    #[serde(flatten)]
    pub kind: KindDef,
}

/// Tool reference in a definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDef {
    /// Path hint
    pub path: String,

    /// Software package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Parameter holding the package version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Node kinds, keyed by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum KindDef {
    /// Fixed token
    Literal {
        /// Token text, or the path hint when `locate` is set
        value: String,
        /// Resolve `value` through the tool locator
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        locate: bool,
        /// Software package for a located literal
        #[serde(default, skip_serializing_if = "Option::is_none")]
        package: Option<String>,
        /// Parameter holding the package version
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },

    /// Switch without a value, optionally conditional on a parameter
    Switch {
        /// Switch name
        name: String,
        /// Parameter that must be non-empty
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<String>,
    },

    /// Parameter value as a bare token
    Value {
        /// Parameter name
        param: String,
        /// Static default
        #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },

    /// Parameter value behind a switch
    ValueWithSwitch {
        /// Parameter name
        param: String,
        /// Switch name
        switch: String,
        /// Static default
        #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },

    /// Parameter value mapped to a switch name
    EnumSwitch {
        /// Parameter name
        param: String,
        /// Value → switch
        switches: IndexMap<String, String>,
        /// Static default
        #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },

    /// Yes/no parameter toggling a switch
    BooleanSwitch {
        /// Parameter name
        param: String,
        /// Switch name
        switch: String,
        /// Emit on `no` instead of `yes`
        #[serde(default)]
        negative: bool,
        /// Static default
        #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },

    /// Regex substitution on a parameter value
    Regex {
        /// Parameter name
        param: String,
        /// Pattern
        pattern: String,
        /// Replacement, `$1`-style groups allowed
        replacement: String,
        /// Static default
        #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },

    /// Job paths of a role
    Path {
        /// Role
        role: PathRole,
        /// Key narrowing the lookup
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        /// Switch preceding each path
        #[serde(default, skip_serializing_if = "Option::is_none")]
        switch: Option<String>,
    },

    /// Located executable
    Exe {
        /// Tool
        tool: ToolDef,
    },

    /// Runtime + `-jar` + archive
    Jar {
        /// Archive
        archive: ToolDef,
        /// Runtime, `java` when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        runtime: Option<ToolDef>,
        /// Arguments placed before `-jar`
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runtime_args: Vec<ConverterDef>,
    },

    /// Ordered concatenation
    List {
        /// Items in order
        items: Vec<ConverterDef>,
    },

    /// Yes/no branch
    If {
        /// Parameter name
        param: String,
        /// Subtree taken on yes
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<ConverterDef>,
        /// Subtree taken on no
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<ConverterDef>,
        /// Static default
        #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },

    /// Keyed branch
    Choose {
        /// Parameter name
        param: String,
        /// Key → subtree
        branches: IndexMap<String, ConverterDef>,
        /// Static default
        #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },

    /// Boolean switches merged into one token
    JoinedFlags {
        /// Boolean-switch definitions
        flags: Vec<ConverterDef>,
    },
}

/// Accept any scalar where a string value is expected
///
/// YAML and TOML users write `default: 4` or `default: true`; booleans map
/// to `yes` / `no`.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(true) => "yes".to_string(),
        Scalar::Bool(false) => "no".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_def_shapes() {
        let defs: Vec<ConverterDef> = serde_yaml::from_str(
            r"
- tandem
- ref: common
- type: switch
  name: v
",
        )
        .unwrap();

        assert_eq!(defs[0], ConverterDef::Literal("tandem".to_string()));
        assert_eq!(defs[1], ConverterDef::reference("common"));
        match &defs[2] {
            ConverterDef::Node(node) => {
                assert_eq!(
                    node.kind,
                    KindDef::Switch {
                        name: "v".to_string(),
                        param: None
                    }
                );
                assert!(node.format.is_none());
            }
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn scalar_defaults() {
        let params: Vec<ParameterDef> = serde_yaml::from_str(
            r"
- name: threads
  type: int
  default: 4
- name: verbose
  type: boolean
  default: false
- name: label
",
        )
        .unwrap();

        assert_eq!(params[0].default.as_deref(), Some("4"));
        assert_eq!(params[0].validator(), Some(ParamValidator::Integer));
        assert_eq!(params[1].default.as_deref(), Some("no"));
        assert_eq!(params[2].kind, ParamType::Text);
        assert_eq!(params[2].default, None);
    }

    #[test]
    fn node_with_format() {
        let def: ConverterDef = serde_json::from_str(
            r#"{"type": "value-with-switch", "param": "t", "switch": "threads",
                "format": {"style": "joined", "separator": "="}}"#,
        )
        .unwrap();
        let ConverterDef::Node(node) = def else {
            panic!("expected node");
        };
        assert_eq!(node.format, Some(SwitchFormat::joined("=")));
    }
}
