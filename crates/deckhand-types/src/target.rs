//! Target model
//!
//! A [`Target`] is a named, typed destination with `beforeDeploy` and
//! `deployed` operation hooks. Targets are read from configuration, get their
//! `index` and owning [`WorkspaceId`] assigned once, and stay immutable for
//! the rest of the run.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Type used when a target does not declare one
pub const DEFAULT_TARGET_TYPE: &str = "local";

/// Type a bare string operation desugars to
pub const OPEN_OPERATION_TYPE: &str = "open";

/// Trim and case-fold a string so that formatting differences do not matter.
///
/// ```rust
/// use deckhand_types::normalize_string;
///
/// assert_eq!(normalize_string(" Prod "), "prod");
/// assert_eq!(normalize_string(""), "");
/// ```
pub fn normalize_string(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Non-owning handle to the workspace a target was loaded for
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorkspaceId(String);

impl WorkspaceId {
    /// Create a new workspace handle
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Get the handle as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deploy lifecycle event an operation chain is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DeployEvent {
    /// Runs the `beforeDeploy` operations
    BeforeDeploy,
    /// Runs the `deployed` operations
    AfterDeployed,
}

impl DeployEvent {
    /// Wire name of the event
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeDeploy => "before-deploy",
            Self::AfterDeployed => "after-deployed",
        }
    }
}

impl fmt::Display for DeployEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusion condition (the `if` field of targets and operations)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Condition {
    /// Operating systems the item applies to (empty = all)
    pub platforms: Vec<String>,
    /// Environment variables that must be set and non-empty
    pub env: Vec<String>,
}

impl Condition {
    /// Check whether the condition constrains anything
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty() && self.env.is_empty()
    }

    /// Evaluate against the current process
    pub fn evaluate(&self) -> bool {
        self.evaluate_with(std::env::consts::OS, |name| std::env::var(name).ok())
    }

    /// Evaluate against an explicit platform and environment lookup
    pub fn evaluate_with<F>(&self, os: &str, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        let os = normalize_string(os);
        let platform_ok = self.platforms.is_empty()
            || self.platforms.iter().any(|p| normalize_string(p) == os);

        platform_ok
            && self
                .env
                .iter()
                .all(|name| lookup(name.trim()).is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Free-form option value attached to targets and operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum OptionValue {
    /// Boolean switch
    Flag(bool),
    /// Integer value
    Integer(i64),
    /// Text value
    Text(String),
}

impl OptionValue {
    /// Render the value as text
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Self::Flag(value) => Cow::Owned(value.to_string()),
            Self::Integer(value) => Cow::Owned(value.to_string()),
            Self::Text(value) => Cow::Borrowed(value),
        }
    }

    /// Interpret the value as an unsigned number
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(value) => u64::try_from(*value).ok(),
            Self::Text(value) => value.trim().parse().ok(),
            Self::Flag(_) => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Structured target operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetOperation {
    /// Operation type (`""` and `"open"` both select the open executor)
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub op_type: String,
    /// Resource the operation works on
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub target: Option<String>,
    /// Inclusion condition
    #[cfg_attr(
        feature = "serde",
        serde(rename = "if", default, skip_serializing_if = "Option::is_none")
    )]
    pub condition: Option<Condition>,
    /// Type-specific fields
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub options: BTreeMap<String, OptionValue>,
}

impl TargetOperation {
    /// Create an operation of the given type
    pub fn new<S: Into<String>>(op_type: S) -> Self {
        Self {
            op_type: op_type.into(),
            ..Self::default()
        }
    }

    /// Set the resource the operation works on
    pub fn with_target<S: Into<String>>(mut self, target: S) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the inclusion condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Add a type-specific option
    pub fn with_option<K: Into<String>, V: Into<OptionValue>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Get a type-specific option
    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// Normalized operation type
    pub fn normalized_type(&self) -> String {
        normalize_string(&self.op_type)
    }
}

/// Operation as written in configuration: a bare string or a structured record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum OperationValue {
    /// Shorthand for an `open` operation on the string
    Shorthand(String),
    /// Full operation record
    Structured(TargetOperation),
}

impl OperationValue {
    /// Desugar into a structured operation.
    ///
    /// Returns `None` for empty or whitespace-only shorthand strings.
    pub fn normalize(&self) -> Option<TargetOperation> {
        match self {
            Self::Structured(operation) => Some(operation.clone()),
            Self::Shorthand(value) if value.trim().is_empty() => None,
            Self::Shorthand(value) => {
                Some(TargetOperation::new(OPEN_OPERATION_TYPE).with_target(value.clone()))
            }
        }
    }
}

impl From<&str> for OperationValue {
    fn from(value: &str) -> Self {
        Self::Shorthand(value.to_string())
    }
}

impl From<TargetOperation> for OperationValue {
    fn from(operation: TargetOperation) -> Self {
        Self::Structured(operation)
    }
}

/// Zero, one or many operation values
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum OperationValues {
    /// A list of operations
    List(Vec<OperationValue>),
    /// A single operation
    Single(OperationValue),
}

impl OperationValues {
    /// Flatten into declaration order
    pub fn to_vec(&self) -> Vec<OperationValue> {
        match self {
            Self::List(values) => values.clone(),
            Self::Single(value) => vec![value.clone()],
        }
    }
}

impl From<Vec<OperationValue>> for OperationValues {
    fn from(values: Vec<OperationValue>) -> Self {
        Self::List(values)
    }
}

/// Deployment/retrieval destination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Target {
    /// Display name (falls back to "Target #<index+1>")
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub name: Option<String>,
    /// Type tag used for plugin resolution
    #[cfg_attr(
        feature = "serde",
        serde(rename = "type", default, skip_serializing_if = "Option::is_none")
    )]
    pub target_type: Option<String>,
    /// Free text description shown in choosers
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub description: Option<String>,
    /// Inclusion condition
    #[cfg_attr(
        feature = "serde",
        serde(rename = "if", default, skip_serializing_if = "Option::is_none")
    )]
    pub condition: Option<Condition>,
    /// Operations run before a deployment
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "before_deploy",
            alias = "beforeDeploy",
            alias = "beforedeploy",
            default,
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub before_deploy: Option<OperationValues>,
    /// Operations run after a deployment
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub deployed: Option<OperationValues>,
    /// Plugin specific settings
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub options: BTreeMap<String, OptionValue>,
    /// Position among sibling targets
    #[cfg_attr(feature = "serde", serde(skip))]
    pub index: usize,
    /// Workspace the target was loaded for
    #[cfg_attr(feature = "serde", serde(skip))]
    pub workspace: WorkspaceId,
}

impl Target {
    /// Create a target with a name and a type
    pub fn new<N: Into<String>, T: Into<String>>(name: N, target_type: T) -> Self {
        Self {
            name: Some(name.into()),
            target_type: Some(target_type.into()),
            ..Self::default()
        }
    }

    /// Set the position among sibling targets
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Set the owning workspace
    pub fn with_workspace(mut self, workspace: WorkspaceId) -> Self {
        self.workspace = workspace;
        self
    }

    /// Set the description
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the `beforeDeploy` operations
    pub fn with_before_deploy<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<OperationValue>,
    {
        self.before_deploy = Some(OperationValues::List(
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Set the `deployed` operations
    pub fn with_deployed<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<OperationValue>,
    {
        self.deployed = Some(OperationValues::List(
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Add a plugin specific option
    pub fn with_option<K: Into<String>, V: Into<OptionValue>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Get a plugin specific option
    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// Normalized type for plugin matching (`""` when absent)
    pub fn normalized_type(&self) -> String {
        self.target_type
            .as_deref()
            .map(normalize_string)
            .unwrap_or_default()
    }

    /// Normalized type, falling back to [`DEFAULT_TARGET_TYPE`]
    pub fn type_or_default(&self) -> String {
        let normalized = self.normalized_type();
        if normalized.is_empty() {
            DEFAULT_TARGET_TYPE.to_string()
        } else {
            normalized
        }
    }

    /// Normalized name used for lookups (`""` when absent)
    pub fn normalized_name(&self) -> String {
        self.name.as_deref().map(normalize_string).unwrap_or_default()
    }

    /// Operation values attached to a lifecycle event, in declaration order
    pub fn operations_for(&self, event: DeployEvent) -> Vec<OperationValue> {
        let values = match event {
            DeployEvent::BeforeDeploy => self.before_deploy.as_ref(),
            DeployEvent::AfterDeployed => self.deployed.as_ref(),
        };
        values.map(OperationValues::to_vec).unwrap_or_default()
    }
}

/// Item that may carry an inclusion condition
pub trait Conditional {
    /// The item's condition, if any
    fn condition(&self) -> Option<&Condition>;
}

impl Conditional for Target {
    fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }
}

impl Conditional for TargetOperation {
    fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }
}

impl<T: Conditional> Conditional for Arc<T> {
    fn condition(&self) -> Option<&Condition> {
        self.as_ref().condition()
    }
}

/// Keep the items whose condition is absent or accepted by `accept`
pub fn filter_conditional_items<T, I, F>(items: I, accept: F) -> Vec<T>
where
    T: Conditional,
    I: IntoIterator<Item = T>,
    F: Fn(&Condition) -> bool,
{
    items
        .into_iter()
        .filter(|item| item.condition().map_or(true, |c| c.is_empty() || accept(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("Prod ", "prod")]
    #[case("  STAGING", "staging")]
    #[case("\tqa\n", "qa")]
    #[case("", "")]
    fn test_normalize_string(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_string(input), expected);
    }

    proptest! {
        #[test]
        fn test_normalize_string_is_idempotent(value in ".*") {
            let once = normalize_string(&value);
            prop_assert_eq!(normalize_string(&once), once.clone());
        }
    }

    #[test]
    fn test_shorthand_desugars_to_open_operation() {
        let shorthand = OperationValue::from("C:\\file.txt");
        let structured = OperationValue::Structured(
            TargetOperation::new("open").with_target("C:\\file.txt"),
        );

        assert_eq!(shorthand.normalize(), structured.normalize());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_empty_shorthand_is_skipped(#[case] value: &str) {
        assert_eq!(OperationValue::from(value).normalize(), None);
    }

    #[test]
    fn test_target_type_normalization() {
        let typed = Target::new("prod", " SFTP ");
        assert_eq!(typed.normalized_type(), "sftp");
        assert_eq!(typed.type_or_default(), "sftp");

        let untyped = Target::default();
        assert_eq!(untyped.normalized_type(), "");
        assert_eq!(untyped.type_or_default(), DEFAULT_TARGET_TYPE);
    }

    #[test]
    fn test_operations_for_event() {
        let target = Target::new("prod", "local")
            .with_before_deploy(["build.log"])
            .with_deployed(vec![
                OperationValue::from("a"),
                OperationValue::from(TargetOperation::new("wait")),
            ]);

        assert_eq!(target.operations_for(DeployEvent::BeforeDeploy).len(), 1);
        assert_eq!(target.operations_for(DeployEvent::AfterDeployed).len(), 2);
        assert!(Target::default()
            .operations_for(DeployEvent::AfterDeployed)
            .is_empty());
    }

    #[test]
    fn test_condition_evaluation() {
        let env = |name: &str| (name == "DEPLOY_TOKEN").then(|| "secret".to_string());

        assert!(Condition::default().evaluate_with("linux", env));
        assert!(Condition {
            platforms: vec!["Linux".to_string()],
            env: vec!["DEPLOY_TOKEN".to_string()],
        }
        .evaluate_with("linux", env));
        assert!(!Condition {
            platforms: vec!["windows".to_string()],
            env: Vec::new(),
        }
        .evaluate_with("linux", env));
        assert!(!Condition {
            platforms: Vec::new(),
            env: vec!["MISSING".to_string()],
        }
        .evaluate_with("linux", env));
    }

    #[test]
    fn test_filter_conditional_items() {
        let never = Condition {
            platforms: vec!["plan9".to_string()],
            env: Vec::new(),
        };
        let operations = vec![
            TargetOperation::new("open"),
            TargetOperation::new("wait").with_condition(never),
            TargetOperation::new("open").with_condition(Condition::default()),
        ];

        let kept = filter_conditional_items(operations, |c| c.evaluate_with("linux", |_| None));
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|op| op.op_type == "open"));
    }

    #[test]
    fn test_option_values() {
        assert_eq!(OptionValue::Integer(250).as_u64(), Some(250));
        assert_eq!(OptionValue::from(" 40 ").as_u64(), Some(40));
        assert_eq!(OptionValue::Integer(-1).as_u64(), None);
        assert_eq!(OptionValue::Flag(true).as_str(), "true");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_target_from_yaml() {
        let yaml = r#"
name: Prod
type: local
dir: /srv/www
beforeDeploy: "C:\\prepare.txt"
deployed:
  - type: wait
    time: 500
  - https://example.com
"#;
        let target: Target = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(target.normalized_name(), "prod");
        assert_eq!(target.option("dir"), Some(&OptionValue::from("/srv/www")));
        assert_eq!(
            target.operations_for(DeployEvent::BeforeDeploy),
            vec![OperationValue::from("C:\\prepare.txt")]
        );

        let deployed = target.operations_for(DeployEvent::AfterDeployed);
        assert_eq!(deployed.len(), 2);
        match &deployed[0] {
            OperationValue::Structured(op) => {
                assert_eq!(op.normalized_type(), "wait");
                assert_eq!(op.option("time").and_then(OptionValue::as_u64), Some(500));
            }
            other => panic!("expected structured operation, got {:?}", other),
        }
    }
}
