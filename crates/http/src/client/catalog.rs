//! Products and categories

use super::request::{ApiRequest, Upload, path_segment};
use super::resource::Resource;
use super::{AdminClient, ClientError};
use crate::types::{Category, Product};
use serde::Serialize;

#[derive(Serialize)]
struct CategoryPosition<'a> {
    id: &'a str,
    position: u32,
}

#[derive(Serialize)]
struct CategoryOrder<'a> {
    order: Vec<CategoryPosition<'a>>,
}

impl AdminClient {
    pub fn products(&self) -> Resource<'_, Product> {
        Resource::new(self, "/products")
    }

    pub fn categories(&self) -> Resource<'_, Category> {
        Resource::new(self, "/categories")
    }

    /// Attach an image to a product; the backend answers with the updated product
    pub async fn upload_product_image(
        &self,
        product_id: &str,
        image: Upload,
    ) -> Result<Product, ClientError> {
        let request = ApiRequest::post(format!("/products/{}/images", path_segment(product_id)))
            .file_field("image", image);
        self.execute(&request).await
    }

    /// Persist the category order produced by the drag-and-drop editor
    ///
    /// Positions are the zero-based index of each id in `ordered_ids`.
    pub async fn reorder_categories<S: AsRef<str>>(
        &self,
        ordered_ids: &[S],
    ) -> Result<(), ClientError> {
        let body = CategoryOrder {
            order: ordered_ids
                .iter()
                .zip(0u32..)
                .map(|(id, position)| CategoryPosition {
                    id: id.as_ref(),
                    position,
                })
                .collect(),
        };
        let request = ApiRequest::put("/categories/reorder").json(&body)?;
        self.execute_empty(&request).await
    }
}
