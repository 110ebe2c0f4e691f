//! Pages, banners, logos and notifications

use super::request::{ApiRequest, Upload};
use super::resource::Resource;
use super::{AdminClient, ClientError};
use crate::types::{Banner, ContentPage, Logo, Notification, NotificationRequest};
use std::fmt;

/// Where an uploaded logo is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogoKind {
    Header,
    Footer,
    Favicon,
    App,
}

impl LogoKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Favicon => "favicon",
            Self::App => "app",
        }
    }
}

impl fmt::Display for LogoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AdminClient {
    /// Content pages; `content` holds the editor's HTML as an opaque string
    pub fn pages(&self) -> Resource<'_, ContentPage> {
        Resource::new(self, "/pages")
    }

    pub fn banners(&self) -> Resource<'_, Banner> {
        Resource::new(self, "/banners")
    }

    /// Create a banner from an image
    pub async fn upload_banner(
        &self,
        title: Option<&str>,
        image: Upload,
    ) -> Result<Banner, ClientError> {
        let mut request = ApiRequest::post("/banners");
        if let Some(title) = title {
            request = request.text_field("title", title);
        }
        self.execute(&request.file_field("image", image)).await
    }

    /// Uploaded logos; new ones are added with [`AdminClient::upload_logo`]
    pub fn logos(&self) -> Resource<'_, Logo> {
        Resource::new(self, "/logos")
    }

    pub async fn upload_logo(&self, kind: LogoKind, image: Upload) -> Result<Logo, ClientError> {
        let request = ApiRequest::post("/logos")
            .text_field("type", kind.as_str())
            .file_field("logo", image);
        self.execute(&request).await
    }

    pub fn notifications(&self) -> Resource<'_, Notification> {
        Resource::new(self, "/notifications")
    }

    /// Broadcast a notification to its audience
    pub async fn send_notification(
        &self,
        notification: &NotificationRequest,
    ) -> Result<Notification, ClientError> {
        let request = ApiRequest::post("/notifications/send").json(notification)?;
        self.execute(&request).await
    }
}
