//! Base lifecycle controller for entity management screens.
//!
//! A concrete screen supplies a [`ScreenDelegate`] that overrides only the
//! steps it cares about; every other step keeps its built-in default. The
//! [`EntityScreenController`] drives the create/edit/retire/unretire/purge
//! lifecycle against an [`EntityGateway`] and publishes [`ScreenEvent`]s to
//! the rendering layer.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::{EntityRecord, EntityUuid, RequestParams},
    error::GatewayError,
};
use tokio::{sync::broadcast, sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};

pub mod catalog;
pub mod config;
pub mod view;

pub use catalog::{MessageCatalog, StaticCatalog};
pub use config::ScreenConfig;
pub use view::{ScreenEvent, ViewModel};

/// Request parameter carrying the REST entity name on every outgoing call.
pub const PARAM_REST_ENTITY_NAME: &str = "rest_entity_name";
/// Request parameter identifying the record to load.
pub const PARAM_UUID: &str = "uuid";

/// Separator between the localized not-found message and the raw error
/// detail surfaced after a failed load.
const LOAD_ERROR_SEPARATOR: &str = ":::";

/// Transport performing entity CRUD against the REST backend. Params always
/// include `rest_entity_name`; `load_entity` params additionally carry `uuid`.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    async fn set_base_url(&self, module_name: &str, rest_version: &str);
    async fn load_entity(&self, params: RequestParams) -> Result<Value, GatewayError>;
    async fn save_or_update_entity(
        &self,
        params: RequestParams,
        entity: &EntityRecord,
    ) -> Result<Value, GatewayError>;
    async fn retire_or_unretire_entity(
        &self,
        params: RequestParams,
        entity: &EntityRecord,
    ) -> Result<Value, GatewayError>;
    async fn purge_entity(
        &self,
        params: RequestParams,
        entity: &EntityRecord,
    ) -> Result<(), GatewayError>;
}

pub struct MissingEntityGateway;

#[async_trait]
impl EntityGateway for MissingEntityGateway {
    async fn set_base_url(&self, _module_name: &str, _rest_version: &str) {}

    async fn load_entity(&self, _params: RequestParams) -> Result<Value, GatewayError> {
        Err(GatewayError::Unconfigured)
    }

    async fn save_or_update_entity(
        &self,
        _params: RequestParams,
        _entity: &EntityRecord,
    ) -> Result<Value, GatewayError> {
        Err(GatewayError::Unconfigured)
    }

    async fn retire_or_unretire_entity(
        &self,
        _params: RequestParams,
        _entity: &EntityRecord,
    ) -> Result<Value, GatewayError> {
        Err(GatewayError::Unconfigured)
    }

    async fn purge_entity(
        &self,
        _params: RequestParams,
        _entity: &EntityRecord,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Unconfigured)
    }
}

/// Builds blank records and hydrates them from transport payloads.
pub trait EntityModelFactory: Send + Sync {
    fn new_instance(&self) -> EntityRecord;
    fn populate(&self, payload: &Value) -> Result<EntityRecord, GatewayError>;
}

/// Default factory for metadata-shaped records.
pub struct MetadataModelFactory;

impl EntityModelFactory for MetadataModelFactory {
    fn new_instance(&self) -> EntityRecord {
        EntityRecord::default()
    }

    fn populate(&self, payload: &Value) -> Result<EntityRecord, GatewayError> {
        serde_json::from_value(payload.clone()).map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

/// Source of the current route's `uuid` parameter.
pub trait RouteParamSource: Send + Sync {
    fn uuid(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticRouteParams {
    uuid: Option<String>,
}

impl StaticRouteParams {
    /// Route without a uuid: the screen follows the new-entity path.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
        }
    }
}

impl RouteParamSource for StaticRouteParams {
    fn uuid(&self) -> Option<String> {
        self.uuid.clone()
    }
}

/// Collaborators handed to delegate steps that need them.
pub struct ScreenServices {
    pub gateway: Arc<dyn EntityGateway>,
    pub factory: Arc<dyn EntityModelFactory>,
    pub catalog: Arc<dyn MessageCatalog>,
}

/// Per-step customization surface of the base controller.
///
/// Every step ships a working default, so a concrete screen implements only
/// the subset it needs and keeps the rest. The one exception is
/// [`required_init_parameters`](ScreenDelegate::required_init_parameters):
/// its default only logs a warning, and a screen that leaves it unimplemented
/// never gets past initialization.
#[async_trait]
pub trait ScreenDelegate: Send + Sync {
    /// Supplies the screen's base parameters. Mandatory override.
    fn required_init_parameters(&self) -> Option<ScreenConfig> {
        warn!(
            "required_init_parameters is not implemented; return a ScreenConfig \
             with module_name, rest_entity_name and cancel_page to wire this screen"
        );
        None
    }

    /// Gate before any save-or-update request. Returning `false` abandons the
    /// operation silently; a screen wanting user feedback reports it here.
    fn validate_before_save_or_update(&self, _entity: &EntityRecord) -> bool {
        debug!("no validation override; accepting the record as-is");
        true
    }

    /// Binds a record to the view model. Sole writer of `view.entity`.
    fn bind_entity(&self, view: &mut ViewModel, entity: EntityRecord) {
        view.entity = entity;
    }

    /// Turns a successful load payload into a record.
    async fn hydrate_loaded_entity(
        &self,
        services: &ScreenServices,
        payload: &Value,
    ) -> Result<EntityRecord, GatewayError> {
        services.factory.populate(payload)
    }

    /// Record bound after a failed load, replacing any partial state.
    fn fallback_entity(&self, services: &ScreenServices) -> EntityRecord {
        services.factory.new_instance()
    }

    /// Screen-specific labels merged over the base set; later keys win.
    fn additional_message_labels(
        &self,
        _catalog: &dyn MessageCatalog,
    ) -> Option<HashMap<String, String>> {
        None
    }

    /// Issues the retire/unretire request. The direction flag is accepted but
    /// not forwarded by the base implementation; a screen that needs distinct
    /// retire and unretire payloads overrides this step.
    async fn retire_or_unretire(
        &self,
        services: &ScreenServices,
        retire: bool,
        params: RequestParams,
        entity: &EntityRecord,
    ) -> Result<(), GatewayError> {
        let _ = retire;
        services
            .gateway
            .retire_or_unretire_entity(params, entity)
            .await
            .map(|_| ())
    }
}

/// Delegate that overrides nothing. Initialization aborts with the
/// missing-parameters warning, mirroring a screen that forgot to bind its
/// base parameters.
pub struct DefaultScreenDelegate;

impl ScreenDelegate for DefaultScreenDelegate {}

/// Where the screen currently is in its lifecycle. Forward-biased; the only
/// back-edges are the error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    NewEntityReady,
    LoadingExisting,
    EntityBound,
    FreshEntityBound,
    SaveInFlight,
    RetireInFlight,
    PurgeInFlight,
    Navigated,
}

struct ControllerState {
    phase: Phase,
    config: Option<ScreenConfig>,
    uuid: EntityUuid,
    view: ViewModel,
    mutation_in_flight: bool,
}

/// The lifecycle state machine coordinating initialization, loading, user
/// actions and navigation for one screen instance.
pub struct EntityScreenController {
    delegate: Arc<dyn ScreenDelegate>,
    services: ScreenServices,
    route: Arc<dyn RouteParamSource>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ScreenEvent>,
}

impl EntityScreenController {
    pub fn new(
        delegate: Arc<dyn ScreenDelegate>,
        gateway: Arc<dyn EntityGateway>,
        route: Arc<dyn RouteParamSource>,
    ) -> Arc<Self> {
        Self::new_with_dependencies(
            delegate,
            gateway,
            Arc::new(MetadataModelFactory),
            Arc::new(StaticCatalog::builtin_en()),
            route,
        )
    }

    pub fn new_with_dependencies(
        delegate: Arc<dyn ScreenDelegate>,
        gateway: Arc<dyn EntityGateway>,
        factory: Arc<dyn EntityModelFactory>,
        catalog: Arc<dyn MessageCatalog>,
        route: Arc<dyn RouteParamSource>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            delegate,
            services: ScreenServices {
                gateway,
                factory,
                catalog,
            },
            route,
            inner: Mutex::new(ControllerState {
                phase: Phase::Uninitialized,
                config: None,
                uuid: EntityUuid::default(),
                view: ViewModel::default(),
                mutation_in_flight: false,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ScreenEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.lock().await.phase
    }

    pub async fn view(&self) -> ViewModel {
        self.inner.lock().await.view.clone()
    }

    pub async fn config(&self) -> Option<ScreenConfig> {
        self.inner.lock().await.config.clone()
    }

    /// Applies a form edit to the bound record. This is the view layer's
    /// write path; binding from the server stays with
    /// [`ScreenDelegate::bind_entity`].
    pub async fn edit_entity<F>(&self, edit: F)
    where
        F: FnOnce(&mut EntityRecord),
    {
        let mut inner = self.inner.lock().await;
        edit(&mut inner.view.entity);
    }

    /// Spawns the page load a screen runs on construction.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.load_page().await })
    }

    /// Entry point: initialize, then load the entity named by the route.
    pub async fn load_page(&self) {
        if self.initialize().await {
            let uuid = { self.inner.lock().await.uuid.clone() };
            self.load_entity(&uuid).await;
        }
    }

    /// Resolves the route uuid, installs the screen configuration, wires the
    /// gateway target and assembles the message labels. A configuration with
    /// missing mandatory fields aborts here: logged, nothing wired, no panic.
    pub async fn initialize(&self) -> bool {
        let uuid = EntityUuid::new(self.route.uuid().unwrap_or_default());
        {
            let mut inner = self.inner.lock().await;
            inner.phase = Phase::Initializing;
            inner.uuid = uuid.clone();
        }

        let Some(config) = self.delegate.required_init_parameters() else {
            error!("screen configuration missing; initialization aborted");
            self.inner.lock().await.phase = Phase::Uninitialized;
            return false;
        };
        if let Some(field) = config.missing_required() {
            error!(field, "screen configuration incomplete; initialization aborted");
            self.inner.lock().await.phase = Phase::Uninitialized;
            return false;
        }

        self.services
            .gateway
            .set_base_url(&config.module_name, &config.rest_version)
            .await;

        let catalog = self.services.catalog.as_ref();
        // Loaded records recompute this from their retired flag.
        let retire_label = retire_or_unretire_label(catalog, &config.entity_name, false);
        let mut labels = base_message_labels(catalog, &config.entity_name, &uuid);
        if let Some(extension) = self.delegate.additional_message_labels(catalog) {
            labels.extend(extension);
        }

        let mut inner = self.inner.lock().await;
        inner.view.retire_or_unretire = retire_label;
        inner.view.message_labels = labels;
        inner.config = Some(config);
        true
    }

    /// Stamps `rest_entity_name` onto an outgoing parameter map. A `None`
    /// input stays `None`; callers must not rely on a populated map in that
    /// branch.
    pub async fn append_base_params(
        &self,
        params: Option<RequestParams>,
    ) -> Option<RequestParams> {
        let mut params = params?;
        let inner = self.inner.lock().await;
        if let Some(config) = &inner.config {
            params.insert(
                PARAM_REST_ENTITY_NAME.to_string(),
                config.rest_entity_name.clone(),
            );
        }
        Some(params)
    }

    /// Empty uuid: bind a fresh record, no network. Non-empty: load from the
    /// gateway; a failure falls back wholesale to a fresh record so the form
    /// is never half-populated.
    pub async fn load_entity(&self, uuid: &EntityUuid) {
        if uuid.is_empty() {
            let entity = self.services.factory.new_instance();
            {
                let mut inner = self.inner.lock().await;
                self.delegate.bind_entity(&mut inner.view, entity);
                inner.phase = Phase::NewEntityReady;
            }
            let _ = self.events.send(ScreenEvent::EntityBound);
            return;
        }

        {
            let mut inner = self.inner.lock().await;
            inner.phase = Phase::LoadingExisting;
        }
        let mut params = RequestParams::new();
        params.insert(PARAM_UUID.to_string(), uuid.to_string());
        let params = self.append_base_params(Some(params)).await.unwrap_or_default();

        match self.services.gateway.load_entity(params).await {
            Ok(payload) => {
                match self
                    .delegate
                    .hydrate_loaded_entity(&self.services, &payload)
                    .await
                {
                    Ok(entity) => self.on_load_entity_successful(entity).await,
                    Err(err) => self.on_load_entity_error(err).await,
                }
            }
            Err(err) => self.on_load_entity_error(err).await,
        }
    }

    async fn on_load_entity_successful(&self, entity: EntityRecord) {
        let entity_name = self.entity_name().await;
        let label = retire_or_unretire_label(
            self.services.catalog.as_ref(),
            &entity_name,
            entity.retired,
        );
        {
            let mut inner = self.inner.lock().await;
            self.delegate.bind_entity(&mut inner.view, entity);
            inner.view.retire_or_unretire = label;
            inner.phase = Phase::EntityBound;
        }
        let _ = self.events.send(ScreenEvent::EntityBound);
    }

    async fn on_load_entity_error(&self, err: GatewayError) {
        let entity = self.delegate.fallback_entity(&self.services);
        let entity_name = self.entity_name().await;
        let catalog = self.services.catalog.as_ref();
        let not_found = catalog.format(&catalog.resolve("entity.error.notFound"), &[&entity_name]);
        {
            let mut inner = self.inner.lock().await;
            self.delegate.bind_entity(&mut inner.view, entity);
            inner.phase = Phase::FreshEntityBound;
        }
        warn!(error = %err, "entity load failed; falling back to a fresh record");
        let _ = self.events.send(ScreenEvent::EntityBound);
        let _ = self.events.send(ScreenEvent::ErrorMessage(format!(
            "{not_found}{LOAD_ERROR_SEPARATOR}{err}"
        )));
    }

    /// Runs the validation step, then issues the save-or-update request.
    /// A rejected validation is a silent no-op: no request, no message.
    pub async fn save_or_update(&self) {
        let entity = {
            let mut inner = self.inner.lock().await;
            if inner.mutation_in_flight {
                warn!("save_or_update skipped; another entity mutation is in flight");
                return;
            }
            if !self.delegate.validate_before_save_or_update(&inner.view.entity) {
                debug!("validation rejected the record; no request issued");
                return;
            }
            inner.mutation_in_flight = true;
            inner.phase = Phase::SaveInFlight;
            inner.view.entity.clone()
        };

        let params = self
            .append_base_params(Some(RequestParams::new()))
            .await
            .unwrap_or_default();
        let outcome = self
            .services
            .gateway
            .save_or_update_entity(params, &entity)
            .await
            .map(|_| ());
        self.finish_mutation(outcome, "save_or_update").await;
    }

    /// Issues the retire/unretire request through the delegate step. Success
    /// and failure handling match save. See [`ScreenDelegate::retire_or_unretire`]
    /// for what happens to the direction flag.
    pub async fn retire_or_unretire_call(&self, retire: bool) {
        let entity = {
            let mut inner = self.inner.lock().await;
            if inner.mutation_in_flight {
                warn!("retire_or_unretire skipped; another entity mutation is in flight");
                return;
            }
            inner.mutation_in_flight = true;
            inner.phase = Phase::RetireInFlight;
            inner.view.entity.clone()
        };

        let params = self
            .append_base_params(Some(RequestParams::new()))
            .await
            .unwrap_or_default();
        let outcome = self
            .delegate
            .retire_or_unretire(&self.services, retire, params, &entity)
            .await;
        self.finish_mutation(outcome, "retire_or_unretire").await;
    }

    /// Marks the record for purging, then issues the purge request. The
    /// transient purge flag is set before the call goes out, always.
    pub async fn purge(&self) {
        let entity = {
            let mut inner = self.inner.lock().await;
            if inner.mutation_in_flight {
                warn!("purge skipped; another entity mutation is in flight");
                return;
            }
            inner.mutation_in_flight = true;
            inner.phase = Phase::PurgeInFlight;
            inner.view.entity.purge = true;
            inner.view.entity.clone()
        };

        let params = self
            .append_base_params(Some(RequestParams::new()))
            .await
            .unwrap_or_default();
        let outcome = self.services.gateway.purge_entity(params, &entity).await;
        self.finish_mutation(outcome, "purge").await;
    }

    async fn finish_mutation(&self, outcome: Result<(), GatewayError>, op: &'static str) {
        self.inner.lock().await.mutation_in_flight = false;
        match outcome {
            Ok(()) => {
                info!(op, "entity mutation committed; navigating away");
                self.cancel().await;
            }
            Err(err) => {
                // View model untouched so the user can retry.
                self.inner.lock().await.phase = Phase::EntityBound;
                error!(op, error = %err, "entity mutation failed");
                let _ = self.events.send(ScreenEvent::ErrorMessage(err.to_string()));
            }
        }
    }

    /// Navigates to the configured cancel page. No confirmation, no state
    /// check; calling it twice resolves to the same target.
    pub async fn cancel(&self) {
        let target = {
            let mut inner = self.inner.lock().await;
            inner.phase = Phase::Navigated;
            inner
                .config
                .as_ref()
                .map(|config| config.cancel_page.clone())
                .unwrap_or_default()
        };
        let _ = self.events.send(ScreenEvent::Navigated { target });
    }

    /// Pure trigger for the external confirmation dialog; carries no state.
    pub fn retire_unretire_delete_popup(&self, element_id: &str) {
        let _ = self.events.send(ScreenEvent::ConfirmationRequested {
            element_id: element_id.to_string(),
        });
    }

    async fn entity_name(&self) -> String {
        self.inner
            .lock()
            .await
            .config
            .as_ref()
            .map(|config| config.entity_name.clone())
            .unwrap_or_default()
    }
}

/// Base label set every screen receives: action labels, retire-reason keys
/// and the `h2SubString` header, which differs for new vs. existing entities.
fn base_message_labels(
    catalog: &dyn MessageCatalog,
    entity_name: &str,
    uuid: &EntityUuid,
) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    labels.insert(
        "delete.forever".to_string(),
        catalog.format(&catalog.resolve("entity.delete"), &[entity_name]),
    );
    for key in [
        "general.name",
        "general.description",
        "general.cancel",
        "general.save",
        "general.update",
        "entity.retired.reason",
        "general.retireReason",
        "general.purge",
        "entity.name.required",
    ] {
        labels.insert(key.to_string(), catalog.resolve(key));
    }
    let header = if uuid.is_empty() {
        catalog.format(&catalog.resolve("entity.new"), &[entity_name])
    } else {
        format!("{} {}", catalog.resolve("general.edit"), entity_name)
    };
    labels.insert("h2SubString".to_string(), header);
    labels
}

fn retire_or_unretire_label(
    catalog: &dyn MessageCatalog,
    entity_name: &str,
    retired: bool,
) -> String {
    let key = if retired { "entity.unretire" } else { "entity.retire" };
    catalog.format(&catalog.resolve(key), &[entity_name])
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
