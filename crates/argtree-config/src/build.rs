//! Building converter trees from task definitions
//!
//! Named converters are reserved first so any definition may reference any
//! name, including its own. Such self references load fine and surface as
//! a cycle when resolution actually reaches them.

use crate::error::LoadError;
use crate::model::{ConverterDef, KindDef, NodeDef, ParamType, ParameterDef, TaskDefinition, ToolDef};
use argtree_core::{
    BooleanBranch, BooleanToSwitch, ConfigError, Converter, ConverterTree, EnumBranch,
    EnumToSwitch, ExeToArgs, JarToArgs, Job, JoinedFlags, ListToArgs, Literal, NodeId, ParamRef,
    ParameterError, PathArgs, RegexToArg, ResolveError, SwitchFlag, ToolLocator, ToolSpec,
    TreeBuilder, ValueInLine, ValueWithSwitch,
};
use std::collections::HashMap;

/// A built task: its converter tree plus declared parameters
#[derive(Debug)]
pub struct CommandTask {
    name: String,
    description: Option<String>,
    parameters: Vec<ParameterDef>,
    tree: ConverterTree,
}

impl CommandTask {
    /// Build from a parsed definition
    pub fn from_definition(def: &TaskDefinition) -> Result<Self, LoadError> {
        let _span = tracing::debug_span!("build_task", task = %def.name).entered();
        let declared = declare_parameters(&def.parameters)?;

        let mut builder = TreeBuilder::new();
        if let Some(format) = &def.default_format {
            builder = builder.with_default_format(format.clone());
        }

        let mut cx = BuildContext {
            builder,
            named: HashMap::new(),
            declared,
        };
        for name in def.converters.keys() {
            let id = cx.builder.reserve();
            cx.builder.label(id, name)?;
            cx.named.insert(name.as_str(), id);
        }
        for (name, converter) in &def.converters {
            let id = cx.reference(name)?;
            cx.fill_named(id, converter)?;
        }
        let root = cx.node(&def.command)?;
        let tree = cx.builder.build(root)?;
        tracing::debug!(nodes = tree.len(), "built converter tree");

        Ok(Self {
            name: def.name.clone(),
            description: def.description.clone(),
            parameters: def.parameters.clone(),
            tree,
        })
    }

    /// Task name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Task summary
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared parameters
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDef] {
        &self.parameters
    }

    /// Declared parameter by name
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Converter tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ConverterTree {
        &self.tree
    }

    /// Form validation of a job's values
    ///
    /// Checks declared parameters and every validator in the tree; each
    /// offending parameter is reported once.
    #[must_use]
    pub fn validate_job(&self, job: &dyn Job) -> Vec<ParameterError> {
        let mut errors = Vec::new();
        for param in &self.parameters {
            let Some(validator) = param.validator() else {
                continue;
            };
            let reference = ParamRef::new(&param.name).with_validator(validator);
            if let Err(err) = reference.validate_job_value(job) {
                errors.push(err);
            }
        }
        for err in self.tree.validate_parameters(job) {
            if !errors.iter().any(|e| e.name == err.name) {
                errors.push(err);
            }
        }
        errors
    }

    /// Resolve the argument vector for a job
    pub fn to_args(&self, job: &dyn Job, locator: &dyn ToolLocator) -> Result<Vec<String>, ResolveError> {
        self.tree.resolve(job, locator)
    }
}

fn declare_parameters(params: &[ParameterDef]) -> Result<HashMap<String, ParameterDef>, LoadError> {
    let mut declared = HashMap::with_capacity(params.len());
    for param in params {
        if param.kind == ParamType::Choice && param.options.is_empty() {
            return Err(LoadError::EmptyChoice(param.name.clone()));
        }
        let mut reference = ParamRef::new(&param.name).or_validator(param.validator());
        if let Some(default) = &param.default {
            reference = reference.with_default(default);
        }
        reference.validate_default()?;

        if declared.insert(param.name.clone(), param.clone()).is_some() {
            return Err(LoadError::DuplicateParameter(param.name.clone()));
        }
    }
    Ok(declared)
}

struct BuildContext<'d> {
    builder: TreeBuilder,
    named: HashMap<&'d str, NodeId>,
    declared: HashMap<String, ParameterDef>,
}

impl<'d> BuildContext<'d> {
    fn reference(&self, name: &str) -> Result<NodeId, LoadError> {
        self.named
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::UnknownReference(name.to_string()))
    }

    /// Fill a reserved named slot
    fn fill_named(&mut self, id: NodeId, def: &'d ConverterDef) -> Result<(), LoadError> {
        match def {
            ConverterDef::Literal(value) => self.builder.fill(id, Literal::new(value), None)?,
            ConverterDef::Ref { name } => {
                let target = self.reference(name)?;
                self.builder.fill(id, ListToArgs::new(vec![target]), None)?;
            }
            ConverterDef::Node(node) => {
                let converter = self.converter(node)?;
                self.builder.fill(id, converter, node.format.clone())?;
            }
        }
        Ok(())
    }

    /// Node for an inline definition; references reuse the named node
    fn node(&mut self, def: &'d ConverterDef) -> Result<NodeId, LoadError> {
        match def {
            ConverterDef::Literal(value) => Ok(self.builder.add(Literal::new(value))),
            ConverterDef::Ref { name } => self.reference(name),
            ConverterDef::Node(node) => {
                let converter = self.converter(node)?;
                Ok(match &node.format {
                    Some(format) => self.builder.add_formatted(converter, format.clone()),
                    None => self.builder.add(converter),
                })
            }
        }
    }

    fn nodes(&mut self, defs: &'d [ConverterDef]) -> Result<Vec<NodeId>, LoadError> {
        defs.iter().map(|def| self.node(def)).collect()
    }

    /// Parameter reference with declared default and validator applied
    fn param(&self, name: &str, default: Option<&String>) -> ParamRef {
        let mut param = ParamRef::new(name);
        if let Some(default) = default {
            param = param.with_default(default);
        }
        match self.declared.get(name) {
            Some(declared) => param
                .or_default(declared.default.clone())
                .or_validator(declared.validator()),
            None => param,
        }
    }

    fn tool(&self, def: &ToolDef) -> ToolSpec {
        let mut tool = ToolSpec::new(&def.path);
        if let Some(package) = &def.package {
            tool = tool.in_package(package);
        }
        if let Some(version) = &def.version {
            tool = tool.with_version(self.param(version, None));
        }
        tool
    }

    fn converter(&mut self, node: &'d NodeDef) -> Result<Converter, LoadError> {
        let converter: Converter = match &node.kind {
            KindDef::Literal {
                value,
                locate,
                package,
                version,
            } => {
                if *locate || package.is_some() {
                    let tool = ToolDef {
                        path: value.clone(),
                        package: package.clone(),
                        version: version.clone(),
                    };
                    Literal::located(self.tool(&tool)).into()
                } else {
                    Literal::new(value).into()
                }
            }
            KindDef::Switch { name, param } => match param {
                Some(param) => SwitchFlag::optional(name, self.param(param, None)).into(),
                None => SwitchFlag::required(name).into(),
            },
            KindDef::Value { param, default } => {
                ValueInLine::new(self.param(param, default.as_ref())).into()
            }
            KindDef::ValueWithSwitch {
                param,
                switch,
                default,
            } => ValueWithSwitch::new(self.param(param, default.as_ref()), switch).into(),
            KindDef::EnumSwitch {
                param,
                switches,
                default,
            } => EnumToSwitch::new(self.param(param, default.as_ref()), switches.clone()).into(),
            KindDef::BooleanSwitch {
                param,
                switch,
                negative,
                default,
            } => {
                let param = self.param(param, default.as_ref());
                if *negative {
                    BooleanToSwitch::negative(param, switch).into()
                } else {
                    BooleanToSwitch::new(param, switch).into()
                }
            }
            KindDef::Regex {
                param,
                pattern,
                replacement,
                default,
            } => RegexToArg::new(self.param(param, default.as_ref()), pattern, replacement)?.into(),
            KindDef::Path { role, key, switch } => {
                let mut path = PathArgs::new(*role);
                if let Some(key) = key {
                    path = path.with_key(key);
                }
                if let Some(switch) = switch {
                    path = path.with_switch(switch);
                }
                path.into()
            }
            KindDef::Exe { tool } => ExeToArgs::new(self.tool(tool)).into(),
            KindDef::Jar {
                archive,
                runtime,
                runtime_args,
            } => {
                let mut jar = JarToArgs::new(self.tool(archive));
                if let Some(runtime) = runtime {
                    jar = jar.with_runtime(self.tool(runtime));
                }
                jar.with_runtime_args(self.nodes(runtime_args)?).into()
            }
            KindDef::List { items } => ListToArgs::new(self.nodes(items)?).into(),
            KindDef::If {
                param,
                then,
                otherwise,
                default,
            } => {
                let missing = |branch| ConfigError::MissingBranch {
                    param: param.clone(),
                    branch,
                };
                let then = then.as_ref().ok_or_else(|| missing("then"))?;
                let otherwise = otherwise.as_ref().ok_or_else(|| missing("else"))?;
                let param = self.param(param, default.as_ref());
                let then = self.node(then)?;
                let otherwise = self.node(otherwise)?;
                BooleanBranch::new(param, then, otherwise).into()
            }
            KindDef::Choose {
                param,
                branches,
                default,
            } => {
                let param = self.param(param, default.as_ref());
                let mut mapped = Vec::with_capacity(branches.len());
                for (key, def) in branches {
                    mapped.push((key.as_str(), self.node(def)?));
                }
                EnumBranch::new(param, mapped).into()
            }
            KindDef::JoinedFlags { flags } => JoinedFlags::new(self.nodes(flags)?).into(),
        };
        Ok(converter)
    }
}
