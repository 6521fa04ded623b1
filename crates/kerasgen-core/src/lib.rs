//! Core domain types shared across the kerasgen workspace.
//!
//! A [`ModelSpec`] describes a Keras functional-API graph as an ordered list
//! of [`LayerEntry`] values, and a [`CompileSpec`] carries the training
//! configuration. The [`NamespaceTable`] maps layer categories to the module
//! paths they are resolved against in the generated script.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// =============================================================================
// Namespace Table
// =============================================================================

/// Category tag for plain Keras layers.
pub const CATEGORY_LAYER: &str = "layer";

/// Category tag for math operations.
pub const CATEGORY_MATH: &str = "math";

/// Immutable mapping from layer categories to module paths of the target
/// library, plus the fixed namespaces used by the assembly statements.
///
/// Built once at startup and shared by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceTable {
    /// Import statement emitted at the top of every script.
    pub preamble: String,
    /// Namespace holding the `Model` class.
    pub model_namespace: String,
    /// Namespace holding the optimizer classes.
    pub optimizer_namespace: String,
    categories: BTreeMap<String, String>,
}

impl NamespaceTable {
    /// The TensorFlow table: `layer` → `tf.keras.layers`, `math` → `tf.math`.
    pub fn tensorflow() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(CATEGORY_LAYER.to_string(), "tf.keras.layers".to_string());
        categories.insert(CATEGORY_MATH.to_string(), "tf.math".to_string());

        Self {
            preamble: "import tensorflow as tf".to_string(),
            model_namespace: "tf.keras".to_string(),
            optimizer_namespace: "tf.keras.optimizers".to_string(),
            categories,
        }
    }

    /// Register an additional category before the table is shared.
    pub fn with_category(mut self, category: impl Into<String>, path: impl Into<String>) -> Self {
        self.categories.insert(category.into(), path.into());
        self
    }

    /// Resolve a category to its module path.
    pub fn resolve(&self, category: &str) -> Option<&str> {
        self.categories.get(category).map(String::as_str)
    }

    /// All known categories in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::tensorflow()
    }
}

// =============================================================================
// Config Values
// =============================================================================

/// Shape of a configuration literal, decided when the request is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// A JSON number.
    Numeric,
    /// A JSON string.
    Text,
    /// `True`, `False` or `None`.
    Keyword,
    /// A JSON array of scalars.
    Tuple(Vec<ConfigValue>),
}

/// One configuration literal: the raw text as the client sent it, plus the
/// kind of JSON value it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue {
    /// Raw literal text. Tuples are stored as their elements joined by `,`.
    pub raw: String,
    /// Value kind decided at parse time.
    pub kind: ValueKind,
}

impl ConfigValue {
    /// A string literal, the form every value took in the original wire format.
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            kind: ValueKind::Text,
        }
    }

    /// A numeric literal.
    pub fn numeric(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            kind: ValueKind::Numeric,
        }
    }

    /// A tuple of scalar literals.
    pub fn tuple(items: Vec<ConfigValue>) -> Self {
        let raw = items
            .iter()
            .map(|item| item.raw.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            raw,
            kind: ValueKind::Tuple(items),
        }
    }

    /// Build a value from a parsed JSON value.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(Self::text(s.clone())),
            Value::Number(n) => Ok(Self::numeric(n.to_string())),
            Value::Bool(true) => Ok(Self::keyword("True")),
            Value::Bool(false) => Ok(Self::keyword("False")),
            Value::Null => Ok(Self::keyword("None")),
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| match item {
                        Value::Array(_) | Value::Object(_) => {
                            Err("nested arrays and objects are not supported".to_string())
                        }
                        scalar => Self::from_json(scalar),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::tuple(items))
            }
            Value::Object(_) => Err("object values are not supported".to_string()),
        }
    }

    /// Convert back to JSON.
    pub fn to_json(&self) -> Value {
        match &self.kind {
            ValueKind::Text => Value::String(self.raw.clone()),
            ValueKind::Numeric => self
                .raw
                .parse::<serde_json::Number>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(self.raw.clone())),
            ValueKind::Keyword => match self.raw.as_str() {
                "True" => Value::Bool(true),
                "False" => Value::Bool(false),
                _ => Value::Null,
            },
            ValueKind::Tuple(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    fn keyword(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            kind: ValueKind::Keyword,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(de::Error::custom)
    }
}

/// Ordered constructor parameters of a layer.
///
/// Declared order is significant and preserved from parsing onward. Accepts
/// either a JSON object (read in document order) or an array of
/// `[name, value]` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerConfig {
    params: Vec<(String, ConfigValue)>,
}

impl LayerConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, text)` pairs, all treated as string literals.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), ConfigValue::text(v)))
                .collect(),
        }
    }

    /// Append a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: ConfigValue) {
        self.params.push((name.into(), value));
    }

    /// Iterate parameters in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl Serialize for LayerConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for (name, value) in &self.params {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct LayerConfigVisitor;

impl<'de> Visitor<'de> for LayerConfigVisitor {
    type Value = LayerConfig;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of layer parameters or a list of [name, value] pairs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut config = LayerConfig::new();
        while let Some((name, value)) = access.next_entry::<String, ConfigValue>()? {
            if config.get(&name).is_some() {
                return Err(de::Error::custom(format!("duplicate parameter `{name}`")));
            }
            config.push(name, value);
        }
        Ok(config)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut config = LayerConfig::new();
        while let Some((name, value)) = access.next_element::<(String, ConfigValue)>()? {
            if config.get(&name).is_some() {
                return Err(de::Error::custom(format!("duplicate parameter `{name}`")));
            }
            config.push(name, value);
        }
        Ok(config)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LayerConfig::new())
    }
}

impl<'de> Deserialize<'de> for LayerConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LayerConfigVisitor)
    }
}

// =============================================================================
// Model Spec
// =============================================================================

/// One node of the architecture: a named, configured operation with an
/// optional reference to its input tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    /// Category resolved through the [`NamespaceTable`].
    pub category: String,
    /// Target-library symbol name, e.g. `Dense`.
    #[serde(rename = "type")]
    pub layer_type: String,
    /// Identifier bound to the layer output in the script.
    pub name: String,
    /// Identifier the layer is called on, if any.
    #[serde(default)]
    pub input: Option<String>,
    /// Constructor parameters in declared order.
    #[serde(default)]
    pub config: LayerConfig,
}

impl LayerEntry {
    /// Create an entry with no input and no parameters.
    pub fn new(
        category: impl Into<String>,
        layer_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            layer_type: layer_type.into(),
            name: name.into(),
            input: None,
            config: LayerConfig::new(),
        }
    }

    /// Shorthand for a `layer` category entry.
    pub fn layer(layer_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(CATEGORY_LAYER, layer_type, name)
    }

    /// Set the input reference.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Append a string-literal parameter.
    pub fn with_param(mut self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        self.config.push(name, ConfigValue::text(raw));
        self
    }

    /// Append a parameter of any kind.
    pub fn with_value(mut self, name: impl Into<String>, value: ConfigValue) -> Self {
        self.config.push(name, value);
        self
    }
}

/// Declarative architecture description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Identifier passed as `inputs=` to the model.
    pub input: String,
    /// Identifier passed as `outputs=` to the model.
    pub output: String,
    /// Layers in topological order.
    #[serde(default)]
    pub layers: Vec<LayerEntry>,
}

impl ModelSpec {
    /// Create an empty spec.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            layers: Vec::new(),
        }
    }

    /// Append a layer.
    pub fn with_layer(mut self, layer: LayerEntry) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

// =============================================================================
// Compile Spec
// =============================================================================

/// Training configuration.
///
/// `batch_size`, `epochs` and `output` are never emitted into the script;
/// they are carried through to the training-job payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileSpec {
    /// Optimizer class name under the optimizer namespace, e.g. `adam`.
    pub optimizer: String,
    pub learning_rate: f64,
    pub loss: String,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub batch_size: u32,
    #[serde(default)]
    pub epochs: u32,
    /// Output location used by the training job.
    #[serde(default)]
    pub output: String,
}

impl CompileSpec {
    /// Create a spec with no metrics and zeroed passthrough fields.
    pub fn new(optimizer: impl Into<String>, learning_rate: f64, loss: impl Into<String>) -> Self {
        Self {
            optimizer: optimizer.into(),
            learning_rate,
            loss: loss.into(),
            metrics: Vec::new(),
            batch_size: 0,
            epochs: 0,
            output: String::new(),
        }
    }

    /// Set the metrics in declared order.
    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    /// Set batch size and epoch count.
    pub fn with_schedule(mut self, batch_size: u32, epochs: u32) -> Self {
        self.batch_size = batch_size;
        self.epochs = epochs;
        self
    }
}
