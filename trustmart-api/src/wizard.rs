//! Multi-step product creation: details, images, optional delivery.

use thiserror::Error;
use tracing::{debug, info, warn};
use trustmart_core::validation::SUBMIT;
use trustmart_core::{HttpError, ValidationErrors};

use crate::deliveries::DeliveriesApi;
use crate::forms::{DeliveryForm, ProductForm};
use crate::products::ProductsApi;
use crate::upload::{ImageFile, UploadApi};

/// Most images a product can carry.
pub const MAX_IMAGES: usize = 5;

const UPLOADING: &str = "Uploading images to IPFS";
const CREATING: &str = "Creating product";
const DONE: &str = "Done";

/// Where the wizard is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// Name, description, price, quantity and currency.
    Details,
    /// Picking images; submitting from here creates the product.
    Images,
    /// Optional delivery details for the created product.
    Delivery,
    /// Finished.
    Done,
}

/// Receives submission progress.
pub trait ProgressSink: Send + Sync {
    /// `percent` is 0..=100; `label` names the current phase.
    fn report(&self, percent: u8, label: &str);
}

/// Logs progress with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, percent: u8, label: &str) {
        info!(percent, label, "Product creation progress");
    }
}

/// Percent reported once `done` of `total` images are pinned.
///
/// Uploads span 10..=80; the remainder covers product creation.
pub fn upload_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 10;
    }
    let share = (done as f64 / total as f64 * 70.0).round() as u8;
    share.saturating_add(10).min(80)
}

/// Result of [`ProductWizard::add_images`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImagesAdded {
    /// Images kept.
    pub accepted: usize,
    /// Files whose type is not `image/*`.
    pub not_images: usize,
    /// Images beyond [`MAX_IMAGES`].
    pub over_limit: usize,
}

impl ImagesAdded {
    /// Whether the image limit was hit. Non-image files are dropped silently.
    pub fn limit_reached(&self) -> bool {
        self.over_limit > 0
    }
}

/// Why a wizard action failed.
#[derive(Debug, Error)]
pub enum WizardError {
    /// A form check failed before any request.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// An upload or backend call failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The action does not apply to the current step.
    #[error("Not available at the {0:?} step")]
    WrongStep(WizardStep),
}

/// Walks a seller through creating a product.
///
/// Images are pinned one at a time in the order they were added, then the
/// product is created with their content ids. Delivery details can follow
/// once the product exists.
#[derive(Debug)]
pub struct ProductWizard {
    products: ProductsApi,
    deliveries: DeliveriesApi,
    uploads: UploadApi,
    step: WizardStep,
    form: ProductForm,
    images: Vec<ImageFile>,
    created_id: Option<u64>,
    progress: u8,
    label: &'static str,
}

impl ProductWizard {
    /// Start at the details step with a prepared form.
    pub fn new(
        products: ProductsApi,
        deliveries: DeliveriesApi,
        uploads: UploadApi,
        form: ProductForm,
    ) -> Self {
        Self {
            products,
            deliveries,
            uploads,
            step: WizardStep::Details,
            form,
            images: Vec::new(),
            created_id: None,
            progress: 0,
            label: "",
        }
    }

    /// Current step.
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Product details as typed.
    pub fn form(&self) -> &ProductForm {
        &self.form
    }

    /// Edit the product details.
    pub fn form_mut(&mut self) -> &mut ProductForm {
        &mut self.form
    }

    /// Images queued for upload, in order.
    pub fn images(&self) -> &[ImageFile] {
        &self.images
    }

    /// Id of the product created by [`submit`](Self::submit), if any.
    pub fn created_product_id(&self) -> Option<u64> {
        self.created_id
    }

    /// Last reported percent and label.
    pub fn progress(&self) -> (u8, &str) {
        (self.progress, self.label)
    }

    fn expect_step(&self, step: WizardStep) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::WrongStep(self.step))
        }
    }

    /// Validate the details and move on to images.
    pub fn next(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Details)?;
        self.form.validate()?;
        self.step = WizardStep::Images;
        Ok(())
    }

    /// Return from images to details.
    pub fn back(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Images)?;
        self.step = WizardStep::Details;
        Ok(())
    }

    /// Add picked files. Only `image/*` files are kept, up to [`MAX_IMAGES`].
    pub fn add_images(
        &mut self,
        files: impl IntoIterator<Item = ImageFile>,
    ) -> Result<ImagesAdded, WizardError> {
        self.expect_step(WizardStep::Images)?;
        let mut added = ImagesAdded::default();
        for file in files {
            if !file.is_image() {
                added.not_images += 1;
            } else if self.images.len() >= MAX_IMAGES {
                added.over_limit += 1;
            } else {
                self.images.push(file);
                added.accepted += 1;
            }
        }
        if added.limit_reached() {
            debug!(dropped = added.over_limit, "Maximum of {} images", MAX_IMAGES);
        }
        Ok(added)
    }

    /// Remove a picked image.
    pub fn remove_image(&mut self, index: usize) -> Option<ImageFile> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    fn set_progress(&mut self, sink: &dyn ProgressSink, percent: u8, label: &'static str) {
        self.progress = percent;
        self.label = label;
        sink.report(percent, label);
    }

    /// Pin the images, create the product and move to the delivery step.
    ///
    /// On failure progress drops back to 0 and the wizard stays on the
    /// images step so the user can retry.
    pub async fn submit(&mut self, sink: &dyn ProgressSink) -> Result<Option<u64>, WizardError> {
        self.expect_step(WizardStep::Images)?;
        if self.images.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.insert(SUBMIT, "Please upload at least one image");
            return Err(errors.into());
        }
        self.form.validate()?;

        match self.upload_and_create(sink).await {
            Ok(id) => {
                self.created_id = id;
                self.step = WizardStep::Delivery;
                info!(product_id = ?id, images = self.images.len(), "Product submitted");
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "Product submission failed");
                self.set_progress(sink, 0, "");
                Err(err)
            }
        }
    }

    async fn upload_and_create(
        &mut self,
        sink: &dyn ProgressSink,
    ) -> Result<Option<u64>, WizardError> {
        self.set_progress(sink, 5, UPLOADING);

        let total = self.images.len();
        let mut cids = Vec::with_capacity(total);
        for i in 0..total {
            let cid = self.uploads.pin(&self.images[i]).await?;
            cids.push(cid);
            self.set_progress(sink, upload_progress(i + 1, total), UPLOADING);
        }

        self.set_progress(sink, 90, CREATING);
        let product = self.form.to_new_product(cids)?;
        let id = self.products.create(&product).await?.id();
        self.set_progress(sink, 100, DONE);
        Ok(id)
    }

    /// Save delivery details for the created product and finish.
    ///
    /// Without a created product id there is nothing to attach them to and
    /// the wizard just finishes.
    pub async fn save_delivery(&mut self, form: &DeliveryForm) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Delivery)?;
        let Some(product_id) = self.created_id else {
            self.step = WizardStep::Done;
            return Ok(());
        };
        let delivery = form.to_new_delivery(product_id)?;
        self.deliveries.create(&delivery).await?;
        self.step = WizardStep::Done;
        Ok(())
    }

    /// Finish without delivery details; they can be added later.
    pub fn skip_delivery(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Delivery)?;
        self.step = WizardStep::Done;
        Ok(())
    }

    /// Start over for the same seller.
    pub fn reset(&mut self) {
        self.form = ProductForm::for_seller(self.form.seller_id);
        self.images.clear();
        self.created_id = None;
        self.progress = 0;
        self.label = "";
        self.step = WizardStep::Details;
    }
}
