//! Draft sessions.

use std::sync::Arc;

use jiff::Timestamp;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info, warn};
use vitrine::{
    draft::{Draft, EditError, MediaPlan, MediaScope},
    media::{Asset, MediaError, MediaKind, MediaRecord, MediaSelector, NewMediaRecord, PublicId},
    products::{Product, ProductUuid},
    resolution::{AssetRef, resolve_display_asset},
    variants::{self, RemovedVariant, SizeToggle, VariantKey, VariantPatch, VariantSpec},
};

use crate::{
    config::drafts::DraftConfig,
    domain::{
        drafts::{
            errors::DraftError,
            pending::{PendingKey, PendingOps},
        },
        products::{DetachOptions, ProductsService, ProductsServiceError},
    },
    media_host::{MediaHost, UploadFile},
};

/// Where a session is in its edit/save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// The draft matches the store.
    Clean,

    /// The draft holds unsaved work.
    Editing,

    /// A save is running; edits are refused.
    Saving,
}

/// Binding for uploaded files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadTarget {
    /// Variant the files belong to; product-level when unset.
    pub variant: Option<VariantKey>,

    /// Size the files are scoped to.
    pub size: Option<String>,

    /// Colour the files depict.
    pub color_name: Option<String>,
}

impl UploadTarget {
    #[must_use]
    pub fn product() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn variant(key: VariantKey) -> Self {
        Self {
            variant: Some(key),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color_name: impl Into<String>) -> Self {
        self.color_name = Some(color_name.into());
        self
    }

    fn records(&self, product: &Product, assets: &[Asset]) -> Result<Vec<NewMediaRecord>, EditError> {
        let index = self
            .variant
            .map(|key| variants::locate(product, key))
            .transpose()?;

        Ok(assets
            .iter()
            .cloned()
            .map(|asset| {
                let mut record = NewMediaRecord::new(asset);
                record.variant_index = index;
                record.size.clone_from(&self.size);
                record.color_name.clone_from(&self.color_name);
                record
            })
            .collect())
    }
}

/// Opens draft sessions against the products service.
#[derive(Clone)]
pub struct DraftSessions {
    products: Arc<dyn ProductsService>,
    media_host: Arc<dyn MediaHost>,
    config: DraftConfig,
    folder: String,
}

impl DraftSessions {
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductsService>,
        media_host: Arc<dyn MediaHost>,
        config: DraftConfig,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            products,
            media_host,
            config,
            folder: folder.into(),
        }
    }

    /// Start editing a product from its stored state.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::NotFound` for an unknown product.
    #[tracing::instrument(name = "drafts.open", skip(self), fields(product_uuid = %product), err)]
    pub async fn open(&self, product: ProductUuid) -> Result<DraftSession, DraftError> {
        let confirmed = self.products.get_product(product).await?;

        Ok(DraftSession {
            product,
            sessions: self.clone(),
            state: Mutex::new(SessionState {
                draft: Draft::new(confirmed),
                phase: SessionPhase::Clean,
                confirmed_at: Timestamp::now(),
            }),
            pending: PendingOps::new(),
        })
    }
}

#[derive(Debug)]
struct SessionState {
    draft: Draft,
    phase: SessionPhase,
    confirmed_at: Timestamp,
}

impl SessionState {
    fn editable(&self) -> Result<(), DraftError> {
        if self.phase == SessionPhase::Saving {
            Err(DraftError::SaveInProgress)
        } else {
            Ok(())
        }
    }

    fn replace(&mut self, draft: Draft) {
        self.phase = if draft.is_dirty() {
            SessionPhase::Editing
        } else {
            SessionPhase::Clean
        };
        self.draft = draft;
    }
}

/// One administrator's edit session on one product.
pub struct DraftSession {
    product: ProductUuid,
    sessions: DraftSessions,
    state: Mutex<SessionState>,
    pending: PendingOps,
}

impl DraftSession {
    #[must_use]
    pub fn product_uuid(&self) -> ProductUuid {
        self.product
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    /// The product as edited.
    pub async fn view(&self) -> Product {
        self.state.lock().await.draft.working().clone()
    }

    /// The product as last confirmed by the store.
    pub async fn confirmed(&self) -> Product {
        self.state.lock().await.draft.snapshot().clone()
    }

    pub async fn draft(&self) -> Draft {
        self.state.lock().await.draft.clone()
    }

    /// When the store last confirmed a write from this session.
    pub async fn confirmed_at(&self) -> Timestamp {
        self.state.lock().await.confirmed_at
    }

    /// Number of uploads and persists still in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Resolve the display record the edited product would show.
    pub async fn preview(&self, asset_ref: &AssetRef) -> Option<MediaRecord> {
        let state = self.state.lock().await;

        resolve_display_asset(state.draft.working(), asset_ref).cloned()
    }

    /// # Errors
    ///
    /// Returns `DraftError::Edit` when the new variant fails validation.
    pub async fn add_variant(&self, spec: VariantSpec) -> Result<VariantKey, DraftError> {
        self.apply(|draft| draft.add_variant(spec)).await
    }

    /// # Errors
    ///
    /// Returns `DraftError::Edit` for an unknown key or a refused toggle.
    pub async fn toggle_size(&self, key: VariantKey, size: &str) -> Result<SizeToggle, DraftError> {
        self.apply(|draft| draft.toggle_size(key, size)).await
    }

    /// # Errors
    ///
    /// Returns `DraftError::Edit` for an unknown key or an invalid patch.
    pub async fn update_variant(&self, key: VariantKey, patch: VariantPatch) -> Result<(), DraftError> {
        self.apply(|draft| Ok((draft.update_variant(key, patch)?, ())))
            .await
    }

    /// Remove a variant along with the media bound to it.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::PersistInFlight` while a variant persist runs,
    /// since removal shifts the positions it reports back, and
    /// `DraftError::UploadInFlight` while an upload targets this or a later
    /// unsaved variant.
    pub async fn remove_variant(&self, key: VariantKey) -> Result<RemovedVariant, DraftError> {
        let (removed, orphans) = {
            let mut state = self.state.lock().await;
            state.editable()?;

            if self.pending.is_persisting() {
                return Err(DraftError::PersistInFlight(key));
            }

            let index = variants::locate(state.draft.working(), key).map_err(EditError::from)?;

            if self.pending.uploads_shifted_by(index) {
                return Err(DraftError::UploadInFlight(key));
            }

            let (draft, removed) = state.draft.remove_variant(key)?;
            let orphans = staged_assets(&state.draft, &removed.detached);
            state.replace(draft);

            (removed, orphans)
        };

        info!(variant = %key, detached = removed.detached.len(), "removed variant from draft");

        if self.sessions.config.purge_remote_on_detach {
            self.purge_quietly(orphans).await;
        }

        Ok(removed)
    }

    /// Upload files to the media host and stage them in the draft.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::RemoteAsset` when the upload fails, in which case
    /// nothing is staged, and `DraftError::Edit` when the target no longer
    /// exists once the upload returns.
    #[tracing::instrument(
        name = "drafts.upload_media",
        skip(self, files, target),
        fields(product_uuid = %self.product, file_count = files.len()),
        err
    )]
    pub async fn upload_media(
        &self,
        files: Vec<UploadFile>,
        target: UploadTarget,
    ) -> Result<Vec<PublicId>, DraftError> {
        if files.is_empty() {
            return Err(EditError::Media(MediaError::Empty).into());
        }

        let _upload = {
            let state = self.state.lock().await;
            state.editable()?;

            self.pending.begin(PendingKey::Upload(target.variant))
        };

        let assets = self
            .sessions
            .media_host
            .upload(files, self.sessions.folder.clone())
            .await?;

        let staged = self
            .apply(|draft| {
                let records = target.records(draft.working(), &assets)?;

                Ok((draft.stage_media(records)?, ()))
            })
            .await;

        if let Err(error) = staged {
            warn!(%error, "uploaded media could not be staged; deleting it");

            let orphans: Vec<_> = assets
                .iter()
                .map(|asset| (asset.public_id.clone(), asset.kind))
                .collect();

            self.purge_quietly(orphans).await;

            return Err(error);
        }

        info!(count = assets.len(), "staged uploaded media");

        Ok(assets.into_iter().map(|asset| asset.public_id).collect())
    }

    /// # Errors
    ///
    /// Returns `DraftError::Edit` when no record has the public id.
    pub async fn remove_media(&self, public_id: &PublicId) -> Result<MediaRecord, DraftError> {
        let (removed, orphans) = {
            let mut state = self.state.lock().await;
            state.editable()?;

            let (draft, removed) = state.draft.remove_media(public_id)?;
            let orphans = staged_assets(&state.draft, std::slice::from_ref(&removed));
            state.replace(draft);

            (removed, orphans)
        };

        if self.sessions.config.purge_remote_on_detach {
            self.purge_quietly(orphans).await;
        }

        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `DraftError::Edit` when the selector matches nothing.
    pub async fn set_primary(&self, selector: MediaSelector) -> Result<(), DraftError> {
        self.apply(|draft| Ok((draft.set_primary(&selector)?, ())))
            .await
    }

    /// Reorder one group of records; the first becomes primary.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::Edit` when `order` is not a permutation of the
    /// group.
    pub async fn reorder_media(&self, scope: MediaScope, order: Vec<PublicId>) -> Result<(), DraftError> {
        self.apply(|draft| Ok((draft.reorder_media(scope, order)?, ())))
            .await
    }

    /// Persist the variant list now, ahead of a full save.
    ///
    /// Media the draft dropped are detached first. Edits made while the
    /// persist runs are kept.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::PersistInFlight` when another persist runs, or
    /// the store's error; the draft keeps its work either way.
    #[tracing::instrument(
        name = "drafts.sync_variant",
        skip(self),
        fields(product_uuid = %self.product, variant = %key),
        err
    )]
    pub async fn sync_variant(&self, key: VariantKey) -> Result<Product, DraftError> {
        let (removed, payload, _persist) = {
            let state = self.state.lock().await;
            state.editable()?;

            variants::locate(state.draft.working(), key).map_err(EditError::from)?;

            let persist = self
                .pending
                .begin_persist(key)
                .ok_or(DraftError::PersistInFlight(key))?;

            (
                state.draft.removed_media(),
                state.draft.variant_payload(),
                persist,
            )
        };

        for record in removed {
            if let Some(confirmed) = self.detach(&record).await? {
                self.rebase(|draft| draft.rebase_confirmed(confirmed)).await;
            }
        }

        let persisted = self
            .sessions
            .products
            .persist_variants(self.product, payload)
            .await?;

        let confirmed = persisted.product.clone();
        self.rebase(|draft| draft.rebase_variants(persisted.product, &persisted.minted))
            .await;

        Ok(confirmed)
    }

    /// Push every pending edit to the store.
    ///
    /// Waits for in-flight uploads and persists first. On failure the draft
    /// keeps exactly the work the store has not confirmed, so calling save
    /// again resumes where it stopped.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::ConcurrentEdit` when pending work does not settle
    /// in time, `DraftError::SaveInProgress` when another save runs, or the
    /// first error a store write reports.
    #[tracing::instrument(name = "drafts.save", skip(self), fields(product_uuid = %self.product), err)]
    pub async fn save(&self) -> Result<Product, DraftError> {
        let draft = self.begin_save().await?;

        match self.run_save(draft).await {
            Ok(draft) => {
                let confirmed = draft.snapshot().clone();

                let mut state = self.state.lock().await;
                state.replace(Draft::new(confirmed.clone()));
                state.confirmed_at = Timestamp::now();

                info!("saved draft");

                Ok(confirmed)
            }
            Err((draft, error)) => {
                let mut state = self.state.lock().await;
                state.replace(draft);

                warn!(%error, "save failed; unsaved edits retained");

                Err(error)
            }
        }
    }

    async fn begin_save(&self) -> Result<Draft, DraftError> {
        let limit = self.sessions.config.settle_timeout();
        let deadline = Instant::now() + limit;

        loop {
            {
                let mut state = self.state.lock().await;
                state.editable()?;

                if self.pending.is_empty() {
                    state.phase = SessionPhase::Saving;

                    return Ok(state.draft.clone());
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());

            if let Err(pending) = self.pending.settle(remaining).await {
                return Err(DraftError::ConcurrentEdit {
                    pending,
                    timeout: limit,
                });
            }
        }
    }

    async fn run_save(&self, mut draft: Draft) -> Result<Draft, (Draft, DraftError)> {
        for record in draft.removed_media() {
            match self.detach(&record).await {
                Ok(Some(confirmed)) => draft = draft.rebase_confirmed(confirmed),
                Ok(None) => {}
                Err(error) => return Err((draft, error)),
            }
        }

        if draft.variants_changed() {
            match self
                .sessions
                .products
                .persist_variants(self.product, draft.variant_payload())
                .await
            {
                Ok(persisted) => {
                    draft = draft.rebase_variants(persisted.product, &persisted.minted);
                }
                Err(error) => return Err((draft, error.into())),
            }
        }

        if !draft.staged().is_empty() {
            match self
                .sessions
                .products
                .attach_media(self.product, draft.staged_records())
                .await
            {
                Ok(confirmed) => draft = draft.rebase_staged(confirmed),
                Err(error) => return Err((draft, error.into())),
            }
        }

        let written = match draft.media_plan() {
            MediaPlan::Unchanged => return Ok(draft),
            MediaPlan::Primary(public_id) => {
                self.sessions
                    .products
                    .set_primary(self.product, MediaSelector::PublicId(public_id))
                    .await
            }
            MediaPlan::Replace(records) => {
                self.sessions
                    .products
                    .replace_media(self.product, records)
                    .await
            }
        };

        match written {
            Ok(confirmed) => Ok(draft.rebase_confirmed(confirmed)),
            Err(error) => Err((draft, error.into())),
        }
    }

    /// Detach a record the draft dropped; `None` when the store no longer
    /// has it.
    async fn detach(&self, record: &MediaRecord) -> Result<Option<Product>, DraftError> {
        let public_id = record.public_id().clone();

        let confirmed = match self
            .sessions
            .products
            .detach_media(self.product, public_id.clone(), DetachOptions::default())
            .await
        {
            Ok(confirmed) => Some(confirmed),
            Err(ProductsServiceError::Media(MediaError::NotFound(_))) => {
                debug!(%public_id, "media already detached");
                None
            }
            Err(error) => return Err(error.into()),
        };

        if self.sessions.config.purge_remote_on_detach {
            self.purge_quietly([(public_id, record.asset.kind)]).await;
        }

        Ok(confirmed)
    }

    async fn apply<T>(
        &self,
        action: impl FnOnce(&Draft) -> Result<(Draft, T), EditError>,
    ) -> Result<T, DraftError> {
        let mut state = self.state.lock().await;
        state.editable()?;

        let (draft, outcome) = action(&state.draft).inspect_err(|error| {
            debug!(%error, "edit rejected");
        })?;

        state.replace(draft);

        Ok(outcome)
    }

    async fn rebase(&self, rebase: impl FnOnce(Draft) -> Draft) {
        let mut state = self.state.lock().await;

        let draft = rebase(state.draft.clone());
        state.replace(draft);
        state.confirmed_at = Timestamp::now();
    }

    async fn purge_quietly(&self, assets: impl IntoIterator<Item = (PublicId, MediaKind)>) {
        for (public_id, kind) in assets {
            if let Err(error) = self
                .sessions
                .media_host
                .delete(public_id.clone(), kind)
                .await
            {
                warn!(%public_id, %error, "failed to delete remote asset");
            }
        }
    }
}

/// Assets of `records` that were uploaded in this draft and never attached.
fn staged_assets(draft: &Draft, records: &[MediaRecord]) -> Vec<(PublicId, MediaKind)> {
    records
        .iter()
        .filter(|record| draft.staged().contains(record.public_id()))
        .map(|record| (record.public_id().clone(), record.asset.kind))
        .collect()
}
