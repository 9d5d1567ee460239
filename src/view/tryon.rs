use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};

use crate::{
    assets::source::ImageSource,
    composite::compositor::{CompositeResult, StaticCompositor},
    foundation::error::{TryOnError, TryOnResult},
    store::notify::{Notification, Notifier},
    view::{
        download::{snapshot_file_name, write_png},
        report,
    },
};

/// Static photo try-on: upload a person photo and a clothing image, preview, download.
pub struct TryOnView {
    compositor: StaticCompositor,
    notifier: Arc<dyn Notifier>,
    person: Option<ImageSource>,
    clothing: Option<ImageSource>,
    download_prefix: String,
}

impl std::fmt::Debug for TryOnView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryOnView")
            .field("compositor", &self.compositor)
            .field("person", &self.person.as_ref().map(ImageSource::describe))
            .field("clothing", &self.clothing.as_ref().map(ImageSource::describe))
            .finish_non_exhaustive()
    }
}

impl TryOnView {
    pub fn new(compositor: StaticCompositor, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            compositor,
            notifier,
            person: None,
            clothing: None,
            download_prefix: "aura".to_string(),
        }
    }

    pub fn with_download_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.download_prefix = prefix.into();
        self
    }

    pub fn set_person(&mut self, source: ImageSource) {
        self.person = Some(source);
    }

    pub fn set_clothing(&mut self, source: ImageSource) {
        self.clothing = Some(source);
    }

    pub fn upload_person(&mut self, bytes: impl Into<Vec<u8>>) {
        self.set_person(ImageSource::from_bytes(bytes));
    }

    pub fn upload_clothing(&mut self, bytes: impl Into<Vec<u8>>) {
        self.set_clothing(ImageSource::from_bytes(bytes));
    }

    pub fn preview(&self) -> Option<&CompositeResult> {
        self.compositor.output()
    }

    /// Composite the current uploads. Both are required.
    #[tracing::instrument(skip(self))]
    pub fn generate_preview(&mut self) -> TryOnResult<&CompositeResult> {
        let result = self
            .compositor
            .compose(self.person.as_ref(), self.clothing.as_ref());
        match result {
            Ok(out) => {
                self.notifier
                    .notify(Notification::success("Try-on preview generated!"));
                Ok(out)
            }
            Err(TryOnError::MissingInput(msg)) => {
                tracing::debug!("{msg}");
                self.notifier.notify(Notification::error(
                    "Please upload both person and clothing images",
                ));
                Err(TryOnError::MissingInput(msg))
            }
            Err(e) => {
                self.notifier.notify(Notification::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Write the current preview into `dir` under a timestamped name.
    pub fn download(&self, dir: &Path, at: DateTime<Utc>) -> TryOnResult<PathBuf> {
        let result = self
            .preview()
            .ok_or_else(|| TryOnError::missing_input("generate a preview first"))
            .and_then(|out| {
                write_png(
                    dir,
                    &snapshot_file_name(&self.download_prefix, at),
                    &out.png,
                )
            });
        let path = report(self.notifier.as_ref(), result)?;
        self.notifier
            .notify(Notification::success("Preview downloaded!"));
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/tryon.rs"]
mod tests;
