//! Inventory controller: owns the catalog and the filtered view, drives the display surface.
//!
//! Lifecycle is `Uninitialized -> Loading -> Ready | Error`. There is no retry path; a
//! failed load is terminal until the application restarts.

use serde::Serialize;

use crate::config::AppConfig;
use crate::inventory::sheets::SheetSource;
use crate::inventory::{self, InventoryError, InventoryStats, Product, StockLevel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Loading,
    Ready,
    Error(String),
}

/// One rendered product card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCard {
    pub sku: String,
    pub name: String,
    /// Image URL, or a placeholder label when missing or unusable
    pub image: ImageRef,
    pub current_stock: u32,
    pub stock_level: StockLevel,
    pub incoming_stock: u32,
    pub total_available: u64,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ImageRef {
    Url(String),
    Placeholder(String),
}

/// What the controller needs from a display. An empty card slice means "no results".
pub trait DisplaySurface {
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, message: Option<String>);
    fn render_cards(&mut self, cards: &[ProductCard]);
    fn set_stats(&mut self, stats: InventoryStats);
}

pub struct InventoryController<D: DisplaySurface> {
    config: AppConfig,
    surface: D,
    state: LoadState,
    catalog: Vec<Product>,
    /// Indices into `catalog`, in catalog order
    filtered: Vec<usize>,
    term: String,
}

impl<D: DisplaySurface> InventoryController<D> {
    pub fn new(config: AppConfig, surface: D) -> Self {
        Self {
            config,
            surface,
            state: LoadState::Uninitialized,
            catalog: Vec::new(),
            filtered: Vec::new(),
            term: String::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    pub fn filtered(&self) -> impl Iterator<Item = &Product> + '_ {
        self.filtered.iter().map(move |&i| &self.catalog[i])
    }

    /// The raw search term last passed to `search`
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Fetch, normalize and publish the catalog
    pub async fn load_catalog<S: SheetSource>(&mut self, source: &S) -> Result<(), InventoryError> {
        self.begin_loading();
        let rows = source.fetch_rows().await;
        self.finish_loading(rows)
    }

    pub fn begin_loading(&mut self) {
        tracing::info!("Loading inventory from {}", self.config.sheet.range);
        self.state = LoadState::Loading;
        self.surface.set_error(None);
        self.surface.set_loading(true);
    }

    /// Apply the outcome of the fetch started by `begin_loading`
    pub fn finish_loading(
        &mut self,
        rows: Result<Vec<Vec<String>>, InventoryError>,
    ) -> Result<(), InventoryError> {
        let built = rows.and_then(|rows| {
            inventory::build_catalog(
                &rows,
                &self.config.columns,
                &self.config.schema.expected_headers,
            )
        });

        self.surface.set_loading(false);

        match built {
            Ok(catalog) => {
                tracing::info!("Loaded {} products", catalog.len());
                self.catalog = catalog;
                self.state = LoadState::Ready;
                let term = std::mem::take(&mut self.term);
                self.search(&term);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error loading products: {}", e);
                let message = format!("Error loading inventory: {}", e);
                self.catalog.clear();
                self.filtered.clear();
                self.state = LoadState::Error(message.clone());
                self.surface.set_error(Some(message));
                self.render();
                self.update_stats();
                Err(e)
            }
        }
    }

    /// Recompute the filtered view from the full catalog, then re-render
    pub fn search(&mut self, term: &str) {
        self.term = term.to_string();
        self.filtered = inventory::filter_indices(&self.catalog, term);
        tracing::debug!("Search {:?} matched {}", term, self.filtered.len());
        self.render();
        self.update_stats();
    }

    pub fn render(&mut self) {
        let cards: Vec<ProductCard> = self.filtered().map(|p| self.card_for(p)).collect();
        self.surface.render_cards(&cards);
    }

    pub fn update_stats(&mut self) {
        let stats = InventoryStats::from_products(self.filtered());
        self.surface.set_stats(stats);
    }

    fn card_for(&self, product: &Product) -> ProductCard {
        ProductCard {
            sku: product.sku.clone(),
            name: product.name.clone(),
            image: self.image_ref(&product.image),
            current_stock: product.current_stock,
            stock_level: product.stock_level(),
            incoming_stock: product.incoming_stock,
            total_available: product.total_available(),
            link: Some(product.url.clone()).filter(|u| !u.is_empty()),
        }
    }

    fn image_ref(&self, image: &str) -> ImageRef {
        let display = &self.config.display;
        let image = image.trim();
        if image.is_empty() {
            return ImageRef::Placeholder(display.no_image_placeholder.clone());
        }
        match reqwest::Url::parse(image) {
            Ok(url) if url.has_host() => ImageRef::Url(image.to_string()),
            _ => ImageRef::Placeholder(display.broken_image_placeholder.clone()),
        }
    }
}
