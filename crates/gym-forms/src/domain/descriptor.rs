//! Field descriptors and layout
//!
//! A descriptor is the static contract of one input. The kind carries only
//! the attributes that make sense for it, so a number field cannot hold a
//! pattern and a text field cannot hold options.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::value_objects::{FieldValue, Pattern, SelectOption, ValueSet};
use crate::error::{FormsError, Result};

/// Custom synchronous rule: value -> error message
pub type ValidateFn = Arc<dyn Fn(&FieldValue) -> Option<String> + Send + Sync>;

/// Side effect run when the field loses focus: (name, value, all values)
pub type BlurFn = Arc<dyn Fn(&str, &FieldValue, &ValueSet) + Send + Sync>;

/// Capitalization applied while typing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capitalize {
    /// "juan pérez" -> "Juan pérez"
    FirstLetter,
    /// "juan pérez" -> "Juan Pérez"
    EachWord,
    Upper,
    Lower,
}

impl Capitalize {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::FirstLetter => upper_first(text),
            Self::EachWord => text
                .split(' ')
                .map(|word| upper_first(&word.to_lowercase()))
                .collect::<Vec<_>>()
                .join(" "),
            Self::Upper => text.to_uppercase(),
            Self::Lower => text.to_lowercase(),
        }
    }
}

fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Input type with its type-specific constraints
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    ShortText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<Pattern>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        capitalize: Option<Capitalize>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Date,
    Time,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
        /// Store the selected id as a number
        #[serde(default)]
        numeric: bool,
    },
    SearchSelect {
        #[serde(default)]
        options: Vec<SelectOption>,
        #[serde(default)]
        numeric: bool,
    },
    Color,
    EmailList {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
}

impl FieldKind {
    /// Unconstrained short text
    pub fn text() -> Self {
        Self::ShortText {
            min_length: None,
            max_length: None,
            pattern: None,
            capitalize: None,
        }
    }

    /// Short text with length bounds
    pub fn text_between(min_length: usize, max_length: usize) -> Self {
        Self::ShortText {
            min_length: Some(min_length),
            max_length: Some(max_length),
            pattern: None,
            capitalize: None,
        }
    }

    pub fn number(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Number { min, max }
    }

    pub fn select(options: Vec<SelectOption>) -> Self {
        Self::Select {
            options,
            numeric: false,
        }
    }

    /// Select whose ids are stored as numbers
    pub fn numeric_select(options: Vec<SelectOption>) -> Self {
        Self::Select {
            options,
            numeric: true,
        }
    }

    pub fn search_select(options: Vec<SelectOption>) -> Self {
        Self::SearchSelect {
            options,
            numeric: false,
        }
    }

    pub fn max_length(&self) -> Option<usize> {
        match self {
            Self::ShortText { max_length, .. } => *max_length,
            _ => None,
        }
    }

    pub fn options(&self) -> &[SelectOption] {
        match self {
            Self::Select { options, .. } | Self::SearchSelect { options, .. } => options,
            _ => &[],
        }
    }

    pub fn is_numeric_select(&self) -> bool {
        matches!(
            self,
            Self::Select { numeric: true, .. } | Self::SearchSelect { numeric: true, .. }
        )
    }

    /// Type name as it appears in definitions
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ShortText { .. } => "short_text",
            Self::Number { .. } => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::Select { .. } => "select",
            Self::SearchSelect { .. } => "search_select",
            Self::Color => "color",
            Self::EmailList { .. } => "email_list",
        }
    }
}

/// Static contract of one input
#[derive(Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_text: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(skip)]
    pub validate: Option<ValidateFn>,
    #[serde(skip)]
    pub on_blur: Option<BlurFn>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            default_value: None,
            placeholder: None,
            helper_text: None,
            disabled: false,
            validate: None,
            on_blur: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_helper_text(mut self, helper: impl Into<String>) -> Self {
        self.helper_text = Some(helper.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Attach a pattern to a short-text field
    pub fn with_pattern(mut self, source: &str) -> Result<Self> {
        let compiled = Pattern::new(source).map_err(|source| FormsError::InvalidPattern {
            field: self.name.clone(),
            source,
        })?;
        match &mut self.kind {
            FieldKind::ShortText { pattern, .. } => {
                *pattern = Some(compiled);
                Ok(self)
            }
            other => Err(FormsError::InvalidDefinition(format!(
                "field {} of type {} cannot carry a pattern",
                self.name,
                other.type_name()
            ))),
        }
    }

    /// Capitalization for a short-text field; ignored for other kinds
    pub fn with_capitalize(mut self, mode: Capitalize) -> Self {
        if let FieldKind::ShortText { capitalize, .. } = &mut self.kind {
            *capitalize = Some(mode);
        }
        self
    }

    pub fn with_validator<F>(mut self, rule: F) -> Self
    where
        F: Fn(&FieldValue) -> Option<String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(rule));
        self
    }

    pub fn with_on_blur<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &FieldValue, &ValueSet) + Send + Sync + 'static,
    {
        self.on_blur = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default_value", &self.default_value)
            .field("disabled", &self.disabled)
            .field("validate", &self.validate.is_some())
            .field("on_blur", &self.on_blur.is_some())
            .finish()
    }
}

/// Grid position of one rendered field (1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlacement {
    pub row: u16,
    pub column: u16,
    #[serde(default = "one")]
    pub row_span: u16,
    #[serde(default = "one")]
    pub col_span: u16,
}

fn one() -> u16 {
    1
}

impl GridPlacement {
    pub fn at(row: u16, column: u16) -> Self {
        Self {
            row,
            column,
            row_span: 1,
            col_span: 1,
        }
    }

    pub fn span(mut self, row_span: u16, col_span: u16) -> Self {
        self.row_span = row_span;
        self.col_span = col_span;
        self
    }
}

/// Field name -> grid placement. Presentation only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout(HashMap<String, GridPlacement>);

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(mut self, name: impl Into<String>, placement: GridPlacement) -> Self {
        self.0.insert(name.into(), placement);
        self
    }

    pub fn placement(&self, name: &str) -> Option<&GridPlacement> {
        self.0.get(name)
    }

    /// Declared placement, or one full row per field in render order
    pub fn placement_or_stacked(&self, name: &str, index: usize) -> GridPlacement {
        self.0
            .get(name)
            .copied()
            .unwrap_or_else(|| GridPlacement::at(index as u16 + 1, 1))
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}
