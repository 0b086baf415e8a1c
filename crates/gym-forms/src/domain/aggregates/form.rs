//! Form Aggregate
//!
//! Owns the value set of one form instance and orchestrates change, blur
//! and submit events over the pure services.
//!
//! The engine is a cheap handle (`Clone`) over shared state so debounced
//! async checks can write their result back after the triggering call has
//! returned. Each check carries the generation number of its field at
//! dispatch time; any later change or dispatch bumps the generation and the
//! old result is dropped on arrival.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{AsyncTrigger, FormConfig};
use crate::domain::descriptor::{FieldDescriptor, GridPlacement, Layout};
use crate::domain::events::{EditRejection, FormEvent};
use crate::domain::services::derivation::{DerivationContext, DerivationTable};
use crate::domain::services::search::rank_options;
use crate::domain::services::validation::{
    field_validation_state, normalize_input, truncate_to_max_length, validate_all_fields,
    validate_field, FieldError, FieldValidationState,
};
use crate::domain::services::visibility::VisibilityRules;
use crate::domain::value_objects::{FieldValue, SelectOption, ValueSet};
use crate::error::{FormsError, Result};
use crate::ports::outbound::{AsyncValidator, OptionSearch, SubmitHandler};

/// Listener called with the full value set after every mutation
pub type ValuesListener = Arc<dyn Fn(&ValueSet) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FormMode {
    Create,
    Edit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum FormState {
    #[default]
    Closed,
    Open(FormMode),
    Submitting(FormMode),
}

impl FormState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

/// Result of a change event
#[derive(Debug)]
pub enum ChangeOutcome {
    /// Value stored; carries the async check when triggered on change
    Applied(Option<PendingCheck>),
    /// Field is locked or disabled
    Locked,
    /// Pattern guard refused the input
    Rejected,
}

impl ChangeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Result of a submit attempt that reached validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    Blocked(FieldError),
}

/// Handle to a scheduled async check
#[derive(Debug)]
pub struct PendingCheck {
    field: String,
    handle: JoinHandle<()>,
}

impl PendingCheck {
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Wait until the check has run (or was superseded)
    pub async fn wait(self) {
        if let Err(err) = self.handle.await {
            warn!(field = %self.field, error = %err, "async check task failed");
        }
    }
}

/// One visible field, ready to draw
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedField {
    pub name: String,
    pub label: String,
    pub kind: &'static str,
    pub placement: GridPlacement,
    pub value: FieldValue,
    pub read_only: bool,
    pub required: bool,
    pub state: FieldValidationState,
}

#[derive(Default)]
struct FormInner {
    status: FormState,
    values: ValueSet,
    errors: BTreeMap<String, String>,
    external: BTreeMap<String, String>,
    touched: HashSet<String>,
    submit_attempted: bool,
    generations: HashMap<String, u64>,
    events: Vec<FormEvent>,
}

impl FormInner {
    fn bump(&mut self, field: &str) -> u64 {
        let generation = self.generations.entry(field.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn bump_all(&mut self) {
        self.generations.values_mut().for_each(|g| *g += 1);
    }

    fn is_current(&self, field: &str, generation: u64) -> bool {
        self.generations.get(field) == Some(&generation)
    }
}

struct Shared {
    descriptors: Vec<FieldDescriptor>,
    layout: Layout,
    locked: HashSet<String>,
    validators: HashMap<String, Arc<dyn AsyncValidator>>,
    searches: HashMap<String, Arc<dyn OptionSearch>>,
    submit: Arc<dyn SubmitHandler>,
    listener: Option<ValuesListener>,
    derivations: DerivationTable,
    visibility: VisibilityRules,
    config: FormConfig,
    inner: Mutex<FormInner>,
}

impl Shared {
    fn descriptor(&self, name: &str) -> Result<&FieldDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| FormsError::FieldNotFound(name.to_string()))
    }

    fn is_locked(&self, descriptor: &FieldDescriptor) -> bool {
        descriptor.disabled || self.locked.contains(&descriptor.name)
    }

    fn refresh_errors(&self, inner: &mut FormInner) {
        let visible = self.visibility.visible_for(&self.descriptors, &inner.values);
        inner.errors = visible
            .into_iter()
            .filter_map(|d| {
                validate_field(d, inner.values.get(&d.name)).map(|e| (d.name.clone(), e))
            })
            .collect();
    }

    fn apply_check(&self, field: &str, generation: u64, error: Option<String>) {
        let mut inner = self.inner.lock();
        if !inner.is_current(field, generation) || inner.status == FormState::Closed {
            debug!(field, generation, "discarding stale async validation result");
            return;
        }
        match &error {
            Some(message) => {
                inner.external.insert(field.to_string(), message.clone());
            }
            None => {
                inner.external.remove(field);
            }
        }
        inner.events.push(FormEvent::AsyncChecked {
            field: field.to_string(),
            error,
        });
    }

    fn notify(&self, values: &ValueSet) {
        if let Some(listener) = &self.listener {
            listener(values);
        }
    }
}

/// Puts a form left in `Submitting` back to `Open` when the submit future
/// completes or is dropped
struct SubmittingGuard<'a> {
    shared: &'a Shared,
    mode: FormMode,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.shared.inner.lock();
        if inner.status == FormState::Submitting(self.mode) {
            inner.status = FormState::Open(self.mode);
        }
    }
}

/// Builder for [`FormEngine`]
pub struct FormBuilder {
    descriptors: Vec<FieldDescriptor>,
    layout: Layout,
    locked: HashSet<String>,
    validators: HashMap<String, Arc<dyn AsyncValidator>>,
    searches: HashMap<String, Arc<dyn OptionSearch>>,
    listener: Option<ValuesListener>,
    derivations: DerivationTable,
    visibility: VisibilityRules,
    config: FormConfig,
}

impl FormBuilder {
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Fields rendered read-only for this instance
    pub fn locked<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locked.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn async_validator<V>(mut self, field: impl Into<String>, validator: V) -> Self
    where
        V: AsyncValidator + 'static,
    {
        self.validators.insert(field.into(), Arc::new(validator));
        self
    }

    pub fn option_search(mut self, field: impl Into<String>, search: Arc<dyn OptionSearch>) -> Self {
        self.searches.insert(field.into(), search);
        self
    }

    pub fn on_values_change<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ValueSet) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn derivations(mut self, table: DerivationTable) -> Self {
        self.derivations = table;
        self
    }

    pub fn visibility(mut self, rules: VisibilityRules) -> Self {
        self.visibility = rules;
        self
    }

    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Check the definition and produce a closed engine
    pub fn build<H>(self, submit: H) -> Result<FormEngine>
    where
        H: SubmitHandler + 'static,
    {
        let mut seen = HashSet::new();
        for descriptor in &self.descriptors {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(FormsError::InvalidDefinition(format!(
                    "duplicate field name: {}",
                    descriptor.name
                )));
            }
        }
        for name in self.validators.keys().chain(self.searches.keys()) {
            if !seen.contains(name.as_str()) {
                return Err(FormsError::FieldNotFound(name.clone()));
            }
        }
        for name in &self.locked {
            if !seen.contains(name.as_str()) {
                warn!(field = %name, "locked field is not part of the form");
            }
        }

        Ok(FormEngine {
            shared: Arc::new(Shared {
                descriptors: self.descriptors,
                layout: self.layout,
                locked: self.locked,
                validators: self.validators,
                searches: self.searches,
                submit: Arc::new(submit),
                listener: self.listener,
                derivations: self.derivations,
                visibility: self.visibility,
                config: self.config,
                inner: Mutex::new(FormInner::default()),
            }),
        })
    }
}

/// Form engine handle
#[derive(Clone)]
pub struct FormEngine {
    shared: Arc<Shared>,
}

impl FormEngine {
    pub fn builder(descriptors: Vec<FieldDescriptor>) -> FormBuilder {
        FormBuilder {
            descriptors,
            layout: Layout::default(),
            locked: HashSet::new(),
            validators: HashMap::new(),
            searches: HashMap::new(),
            listener: None,
            derivations: DerivationTable::gym_payments(),
            visibility: VisibilityRules::gym_payments(),
            config: FormConfig::default(),
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.shared.descriptors
    }

    pub fn config(&self) -> &FormConfig {
        &self.shared.config
    }

    pub fn state(&self) -> FormState {
        self.shared.inner.lock().status
    }

    pub fn values(&self) -> ValueSet {
        self.shared.inner.lock().values.clone()
    }

    pub fn value(&self, name: &str) -> FieldValue {
        self.shared.inner.lock().values.get(name).clone()
    }

    pub fn is_locked(&self, name: &str) -> Result<bool> {
        let descriptor = self.shared.descriptor(name)?;
        Ok(self.shared.is_locked(descriptor))
    }

    /// Current error per field; async errors take priority
    pub fn errors(&self) -> BTreeMap<String, String> {
        let inner = self.shared.inner.lock();
        let mut errors = inner.errors.clone();
        errors.extend(inner.external.iter().map(|(k, v)| (k.clone(), v.clone())));
        errors
    }

    pub fn external_error(&self, name: &str) -> Option<String> {
        self.shared.inner.lock().external.get(name).cloned()
    }

    pub fn field_state(&self, name: &str) -> Result<FieldValidationState> {
        let descriptor = self.shared.descriptor(name)?;
        let inner = self.shared.inner.lock();
        let touched = inner.submit_attempted || inner.touched.contains(name);
        Ok(field_validation_state(
            descriptor,
            inner.values.get(name),
            inner.external.get(name).map(String::as_str),
            touched,
        ))
    }

    /// Descriptors to render for the current values
    pub fn visible_fields(&self) -> Vec<&FieldDescriptor> {
        let values = self.values();
        self.shared
            .visibility
            .visible_for(&self.shared.descriptors, &values)
    }

    /// Visible fields with placement, value and validation state
    pub fn render_plan(&self) -> Vec<RenderedField> {
        let inner = self.shared.inner.lock();
        self.shared
            .visibility
            .visible_for(&self.shared.descriptors, &inner.values)
            .into_iter()
            .enumerate()
            .map(|(index, d)| {
                let touched = inner.submit_attempted || inner.touched.contains(&d.name);
                RenderedField {
                    name: d.name.clone(),
                    label: d.label.clone(),
                    kind: d.kind.type_name(),
                    placement: self.shared.layout.placement_or_stacked(&d.name, index),
                    value: inner.values.get(&d.name).clone(),
                    read_only: self.shared.is_locked(d),
                    required: d.required,
                    state: field_validation_state(
                        d,
                        inner.values.get(&d.name),
                        inner.external.get(&d.name).map(String::as_str),
                        touched,
                    ),
                }
            })
            .collect()
    }

    /// Whether the submit control should be enabled
    pub fn can_submit(&self) -> bool {
        let inner = self.shared.inner.lock();
        if !inner.status.is_open() || !inner.external.is_empty() {
            return false;
        }
        self.shared
            .visibility
            .visible_for(&self.shared.descriptors, &inner.values)
            .into_iter()
            .filter(|d| d.required)
            .all(|d| !inner.values.get(&d.name).is_empty())
    }

    /// Options for a select field matching `query`.
    ///
    /// Uses the registered search capability with the configured tenant;
    /// falls back to ranking the descriptor's own options.
    pub fn search_options(&self, field: &str, query: &str) -> Result<Vec<SelectOption>> {
        let descriptor = self.shared.descriptor(field)?;
        let limit = self.shared.config.search_limit;
        match (
            self.shared.searches.get(field),
            self.shared.config.tenant_id.as_ref(),
        ) {
            (Some(search), Some(tenant)) => {
                let mut found = search.search(tenant, query);
                found.truncate(limit);
                Ok(found)
            }
            (Some(_), None) => {
                warn!(field, "option search registered but no tenant configured");
                Ok(rank_options(descriptor.kind.options(), query, limit))
            }
            (None, _) => Ok(rank_options(descriptor.kind.options(), query, limit)),
        }
    }

    /// Get and clear accumulated events
    pub fn take_events(&self) -> Vec<FormEvent> {
        std::mem::take(&mut self.shared.inner.lock().events)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Open empty, seeded from field defaults
    pub fn open_create(&self) -> Result<()> {
        let seed = self
            .shared
            .descriptors
            .iter()
            .map(|d| (d.name.clone(), d.default_value.clone().unwrap_or_default()))
            .collect();
        self.open(FormMode::Create, seed)
    }

    /// Open with existing values
    pub fn open_edit(&self, initial: ValueSet) -> Result<()> {
        let mut seed = initial;
        for descriptor in &self.shared.descriptors {
            if !seed.contains(&descriptor.name) {
                seed.set(descriptor.name.clone(), FieldValue::Null);
            }
        }
        self.open(FormMode::Edit, seed)
    }

    fn open(&self, mode: FormMode, seed: ValueSet) -> Result<()> {
        let values: ValueSet = seed
            .iter()
            .map(|(name, value)| {
                let value = match self.shared.descriptor(name) {
                    Ok(descriptor) => truncate_to_max_length(descriptor, value.clone()),
                    Err(_) => value.clone(),
                };
                (name.clone(), value)
            })
            .collect();

        let snapshot = {
            let mut inner = self.shared.inner.lock();
            if matches!(inner.status, FormState::Submitting(_)) {
                return Err(FormsError::SubmitInFlight);
            }
            inner.status = FormState::Open(mode);
            inner.values = values;
            inner.errors.clear();
            inner.external.clear();
            inner.touched.clear();
            inner.submit_attempted = false;
            inner.bump_all();
            self.shared.refresh_errors(&mut inner);
            inner.events.push(FormEvent::Opened { mode });
            inner.values.clone()
        };

        info!(?mode, fields = self.shared.descriptors.len(), "form opened");
        self.shared.notify(&snapshot);
        Ok(())
    }

    /// Close and drop the value set. In-flight checks are invalidated.
    pub fn close(&self) {
        let mut inner = self.shared.inner.lock();
        inner.status = FormState::Closed;
        inner.values = ValueSet::new();
        inner.errors.clear();
        inner.external.clear();
        inner.touched.clear();
        inner.submit_attempted = false;
        inner.bump_all();
        inner.events.push(FormEvent::Closed);
        debug!("form closed");
    }

    /// User edited a field
    pub fn change(&self, name: &str, input: impl Into<FieldValue>) -> Result<ChangeOutcome> {
        let descriptor = self.shared.descriptor(name)?;
        let input = input.into();

        let snapshot = {
            let mut inner = self.shared.inner.lock();
            match inner.status {
                FormState::Open(_) => {}
                FormState::Submitting(_) => return Err(FormsError::SubmitInFlight),
                FormState::Closed => return Err(FormsError::NotOpen),
            }

            if self.shared.is_locked(descriptor) {
                debug!(field = name, "ignoring edit of locked field");
                inner.events.push(FormEvent::EditRejected {
                    field: name.to_string(),
                    reason: EditRejection::Locked,
                });
                return Ok(ChangeOutcome::Locked);
            }

            let Some(value) = normalize_input(descriptor, input) else {
                debug!(field = name, "input rejected by pattern");
                inner.events.push(FormEvent::EditRejected {
                    field: name.to_string(),
                    reason: EditRejection::PatternMismatch,
                });
                return Ok(ChangeOutcome::Rejected);
            };

            let previous = inner.values.clone();
            let mut next = previous.clone();
            next.set(name, value);
            let ctx = DerivationContext::new(&self.shared.descriptors, &previous)
                .with_locked(&self.shared.locked);
            let next = self.shared.derivations.apply(name, &ctx, next);

            let changed = next.changed_from(&previous);
            for field in &changed {
                inner.bump(field);
                inner.external.remove(field);
            }
            inner.touched.insert(name.to_string());
            inner.values = next;
            self.shared.refresh_errors(&mut inner);
            inner.events.push(FormEvent::ValueChanged {
                field: name.to_string(),
                derived: changed.into_iter().filter(|f| f != name).collect(),
            });
            inner.values.clone()
        };

        self.shared.notify(&snapshot);

        let check = match self.shared.config.async_trigger {
            AsyncTrigger::Change => self.schedule_check(name),
            AsyncTrigger::Blur => None,
        };
        Ok(ChangeOutcome::Applied(check))
    }

    /// Field lost focus: run its hook, then the async check when triggered
    /// on blur
    pub fn blur(&self, name: &str) -> Result<Option<PendingCheck>> {
        let descriptor = self.shared.descriptor(name)?;

        let (value, values) = {
            let mut inner = self.shared.inner.lock();
            if inner.status == FormState::Closed {
                return Err(FormsError::NotOpen);
            }
            inner.touched.insert(name.to_string());
            inner.events.push(FormEvent::Blurred {
                field: name.to_string(),
            });
            (inner.values.get(name).clone(), inner.values.clone())
        };

        if let Some(hook) = &descriptor.on_blur {
            hook(name, &value, &values);
        }

        Ok(match self.shared.config.async_trigger {
            AsyncTrigger::Blur => self.schedule_check(name),
            AsyncTrigger::Change => None,
        })
    }

    /// Debounced async check for `name`, if it has a validator
    fn schedule_check(&self, name: &str) -> Option<PendingCheck> {
        let validator = Arc::clone(self.shared.validators.get(name)?);

        let (generation, value, values) = {
            let mut inner = self.shared.inner.lock();
            if inner.status == FormState::Closed {
                return None;
            }
            let generation = inner.bump(name);
            let value = inner.values.get(name).clone();
            if value.is_empty() {
                inner.external.remove(name);
                return None;
            }
            (generation, value, inner.values.clone())
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(field = name, "no async runtime; skipping async validation");
                return None;
            }
        };

        debug!(field = name, generation, "scheduling async validation");
        let shared = Arc::clone(&self.shared);
        let field = name.to_string();
        let delay = self.shared.config.debounce();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if !shared.inner.lock().is_current(&field, generation) {
                debug!(field = %field, generation, "async validation superseded before dispatch");
                return;
            }
            let error = match validator.validate(value, values).await {
                Ok(error) => error,
                Err(err) => {
                    warn!(field = %field, error = %err, "async validator failed; treating field as valid");
                    None
                }
            };
            shared.apply_check(&field, generation, error);
        });

        Some(PendingCheck {
            field: name.to_string(),
            handle,
        })
    }

    /// Trim, validate and hand the values to the submit handler.
    ///
    /// Validation failures come back as [`SubmitOutcome::Blocked`]; only
    /// misuse and the handler's own failure are errors.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let (mode, values, trimmed_changed) = {
            let mut inner = self.shared.inner.lock();
            let mode = match inner.status {
                FormState::Open(mode) => mode,
                FormState::Submitting(_) => return Err(FormsError::SubmitInFlight),
                FormState::Closed => return Err(FormsError::NotOpen),
            };

            inner.submit_attempted = true;
            let trimmed = inner.values.trimmed();
            let trimmed_changed = trimmed != inner.values;
            inner.values = trimmed;
            self.shared.refresh_errors(&mut inner);

            let visible = self
                .shared
                .visibility
                .visible_for(&self.shared.descriptors, &inner.values);

            if let Some(error) = validate_all_fields(visible.iter().copied(), &inner.values) {
                info!(field = %error.field, "submit blocked by validation");
                inner.events.push(FormEvent::SubmitBlocked {
                    error: error.clone(),
                });
                return Ok(SubmitOutcome::Blocked(error));
            }

            let pending = self
                .shared
                .descriptors
                .iter()
                .find_map(|d| inner.external.get(&d.name).map(|m| FieldError::new(&d.name, m)));
            if let Some(error) = pending {
                info!(field = %error.field, "submit blocked by async validation");
                inner.events.push(FormEvent::SubmitBlocked {
                    error: error.clone(),
                });
                return Ok(SubmitOutcome::Blocked(error));
            }

            inner.status = FormState::Submitting(mode);
            (mode, inner.values.clone(), trimmed_changed)
        };

        if trimmed_changed {
            self.shared.notify(&values);
        }

        let guard = SubmittingGuard {
            shared: &self.shared,
            mode,
        };
        let result = self.shared.submit.submit(values).await;
        drop(guard);

        let mut inner = self.shared.inner.lock();
        match result {
            Ok(()) => {
                info!(?mode, "form submitted");
                inner.events.push(FormEvent::Submitted);
                Ok(SubmitOutcome::Submitted)
            }
            Err(err) => {
                warn!(?mode, error = %err, "submit handler failed");
                inner.events.push(FormEvent::SubmitFailed {
                    reason: err.to_string(),
                });
                Err(FormsError::Submit(err))
            }
        }
    }
}

impl std::fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEngine")
            .field("fields", &self.shared.descriptors.len())
            .field("state", &self.state())
            .finish()
    }
}
