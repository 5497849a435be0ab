//! Item templates for the dynamo-bulk-load tool.
//!
//! A template is a JSON document with `$NAME` placeholders. The renderer
//! substitutes a fixed set of per-item variables into the template text and
//! parses the result into a JSON object ready to be written as a DynamoDB item.
//!
//! # Architecture
//!
//! ```text
//! template.json
//!        │
//!        ▼
//! ┌──────────────────┐
//! │   ItemRenderer   │
//! │                  │
//! │  - template      │
//! │  - offset (min)  │
//! │  - index         │
//! └────────┬─────────┘
//!          │  ItemVars { UUID, NOW, BUILD, FOO }
//!          ▼
//!    RenderedItem (serde_json::Map)
//! ```
//!
//! # Example
//!
//! ```rust
//! use item_template::{ItemRenderer, Template};
//!
//! let template = Template::parse(r#"{"id": "$UUID", "build": $BUILD, "foo": "$FOO"}"#).unwrap();
//! let mut renderer = ItemRenderer::new(template);
//!
//! let item = renderer.next_item().unwrap();
//! assert_eq!(item["build"], 1);
//! assert_eq!(item["foo"], "BAR");
//! ```
//!
//! # Placeholders
//!
//! - `$UUID` - random UUID v4, new for every item
//! - `$NOW` - Unix timestamp in seconds, shifted by the configured minute offset
//! - `$BUILD` - 1-based item sequence number
//! - `$FOO` - the constant `BAR`
//!
//! `${NAME}` is accepted as an alternative spelling and `$$` renders a literal `$`.

pub mod error;
pub mod renderer;
pub mod template;
pub mod vars;

pub use error::TemplateError;
pub use renderer::{ItemRenderer, RenderedItem};
pub use template::Template;
pub use vars::{future_timestamp_seconds, ItemVars, PLACEHOLDER_NAMES};
