/// Commerce recommendations renderer
///
/// Fetches recommendation units from the storefront's GraphQL service and
/// turns the selected unit into product cards, running the footer slot for
/// each product.
///
/// Service headers mirror what the storefront sends:
/// `Magento-Store-View-Code`, `Magento-Environment-Id` and `x-api-key`.
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::{ConfigReader, API_KEY_KEY, COMMERCE_ENDPOINT_KEY, ENVIRONMENT_ID_KEY, STORE_VIEW_CODE_KEY},
    error::{AppError, AppResult},
    models::{Dictionary, Filters, HistoryEntry, ProductView},
    services::providers::{
        FooterSlot, ProductListProps, RecommendationRenderer, RenderedCard, SlotContext,
    },
};

const RECOMMENDATIONS_QUERY: &str = r#"
query GetRecommendations(
  $pageType: PageType
  $currentSku: String
  $userViewHistory: [ViewHistoryInput]
  $userPurchaseHistory: [PurchaseHistoryInput]
) {
  recommendations(
    pageType: $pageType
    currentSku: $currentSku
    userViewHistory: $userViewHistory
    userPurchaseHistory: $userPurchaseHistory
  ) {
    results {
      displayOrder
      pageType
      typeId
      unitId
      unitName
      storefrontLabel
      productsView {
        __typename
        sku
        name
        urlKey
      }
    }
    totalResults
  }
}
"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: RecommendationVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationVariables<'a> {
    page_type: Option<&'a str>,
    current_sku: Option<&'a str>,
    user_view_history: &'a [HistoryEntry],
    user_purchase_history: &'a [HistoryEntry],
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationsData {
    recommendations: RecommendationsPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationsPayload {
    #[serde(default)]
    results: Vec<RecommendationUnit>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationUnit {
    #[serde(default)]
    display_order: Option<i64>,
    #[serde(default)]
    type_id: Option<String>,
    #[serde(default)]
    unit_name: Option<String>,
    #[serde(default)]
    products_view: Vec<ProductView>,
}

#[derive(Clone)]
pub struct CommerceRenderer {
    http_client: HttpClient,
    endpoint: String,
    headers: Vec<(&'static str, String)>,
    dictionary: Dictionary,
}

impl CommerceRenderer {
    pub fn new(config: &dyn ConfigReader, dictionary: Dictionary) -> AppResult<Self> {
        let endpoint = config.config_value(COMMERCE_ENDPOINT_KEY).ok_or_else(|| {
            AppError::InvalidInput("Commerce endpoint is not configured".to_string())
        })?;

        let headers = [
            ("Magento-Store-View-Code", STORE_VIEW_CODE_KEY),
            ("Magento-Environment-Id", ENVIRONMENT_ID_KEY),
            ("x-api-key", API_KEY_KEY),
        ]
        .into_iter()
        .filter_map(|(header, key)| config.config_value(key).map(|value| (header, value)))
        .collect();

        Ok(Self {
            http_client: HttpClient::new(),
            endpoint,
            headers,
            dictionary,
        })
    }

    fn build_request<'a>(props: &'a ProductListProps) -> GraphQlRequest<'a> {
        GraphQlRequest {
            query: RECOMMENDATIONS_QUERY,
            variables: RecommendationVariables {
                page_type: props.page_type.as_deref(),
                current_sku: props.current_sku.as_deref(),
                user_view_history: &props.user_view_history,
                user_purchase_history: &props.user_purchase_history,
            },
        }
    }

    /// Picks the unit to show and returns its products in order
    ///
    /// With a `typeId` filter only units of that type qualify. Among the
    /// qualifying units the lowest display order wins.
    fn select_products(
        response: GraphQlResponse<RecommendationsData>,
        filters: &Filters,
    ) -> AppResult<Vec<ProductView>> {
        if !response.errors.is_empty() {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(AppError::Collaborator(format!(
                "Recommendations query failed: {}",
                messages.join("; ")
            )));
        }

        let data = response.data.ok_or_else(|| {
            AppError::Collaborator("Recommendations response missing data".to_string())
        })?;

        let unit = data
            .recommendations
            .results
            .into_iter()
            .filter(|unit| match &filters.type_id {
                Some(type_id) => unit.type_id.as_deref() == Some(type_id.as_str()),
                None => true,
            })
            .min_by_key(|unit| unit.display_order.unwrap_or(i64::MAX));

        match unit {
            Some(unit) => {
                tracing::debug!(
                    unit = ?unit.unit_name,
                    type_id = ?unit.type_id,
                    products = unit.products_view.len(),
                    "Selected recommendation unit"
                );
                Ok(unit.products_view)
            }
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl RecommendationRenderer for CommerceRenderer {
    async fn render(
        &self,
        props: ProductListProps,
        footer: Arc<dyn FooterSlot>,
    ) -> AppResult<Vec<RenderedCard>> {
        let mut request = self
            .http_client
            .post(&self.endpoint)
            .json(&Self::build_request(&props));
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Recommendations request failed");
            return Err(AppError::Collaborator(format!(
                "Recommendations service returned status {}",
                status
            )));
        }

        let payload: GraphQlResponse<RecommendationsData> = response.json().await?;
        let products = Self::select_products(payload, &props.filters)?;

        Ok(products
            .into_iter()
            .map(|product| {
                footer.render(SlotContext {
                    product,
                    dictionary: self.dictionary.clone(),
                })
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "commerce"
    }
}
