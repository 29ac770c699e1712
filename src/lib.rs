/*!
# Spreadsheet Catalog

A browser front end for a product catalog kept in a remote spreadsheet, built in Rust.

## Overview

The spreadsheet document is the only store. Every interaction reads the
selected worksheet afresh into an in-memory snapshot, renders it, and
discards it; writes go straight back to the document and the user reloads
to see them. There is no caching, locking or conflict detection: a write
computed from a stale snapshot can land on the wrong row, and the last
write wins.

## Architecture

### Frontend Layer
- **Technologies**: HTML rendered server-side from a Handlebars template
- **Key Components**:
  - Sheet selector - Lists the document's worksheets
  - Data table - The whole snapshot, unfiltered
  - Image gallery - One tile per row with an image link
  - Search box - Case-insensitive filter on `id` and `name`
  - Add/Update/Delete forms - Each with its own status message

### Backend Layer
- **Technologies**: Rust, axum, reqwest
- **Core Components**:
  - Sheet store - Read-all, append, update-cell and delete-row against the document
  - Table model - Header discovery, padding, identifier lookup and offsets
  - Link resolver - Turns shared-drive viewer links into direct-fetch links
  - Catalog - Load with fallback, search, add, update, delete
  - Gallery - Link or inline (fetched, decoded, embedded) images

## Modules

- **config**: Defaults, JSON config file and `CATALOG_*` environment overrides
- **error**: Error types for the store, table reading and configuration
- **table**: Snapshot of one worksheet and its 1-based offsets
- **drive**: Shared-drive link rewriting and image column detection
- **store**: The `SheetStore` trait and the in-memory store
- **google**: `SheetStore` over the Sheets REST API
- **catalog**: The read/search/write operations and their notices
- **gallery**: Image tiles for a snapshot
- **export**: CSV and XLSX downloads
- **render**: The page template
- **app**: Routing and middleware

## REST API Endpoints

- `GET /api/sheets` - Worksheet titles
- `GET /api/sheets/{tab}` - Snapshot of one worksheet
- `GET /api/sheets/{tab}/search?q=` - Rows matching a term
- `GET /api/sheets/{tab}/export?format=csv|xlsx` - Download
- `POST /api/sheets/{tab}/rows` - Append a product
- `PATCH /api/sheets/{tab}/rows/{id}` - Replace non-blank fields
- `DELETE /api/sheets/{tab}/rows/{id}` - Remove a product
- `GET /api/resolve?link=` - Direct-fetch form of an image link
*/

pub mod catalog;
pub mod config;
pub mod drive;
pub mod error;
pub mod export;
pub mod gallery;
pub mod store;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod google;
#[cfg(feature = "web")]
pub mod render;

pub use catalog::{Catalog, NewProduct, Notice, ProductUpdate, Snapshot};
pub use error::{ConfigError, SheetError, TableError};
pub use store::{MemorySheets, SheetStore};
pub use table::Table;
