//! Rasterization engine: geometry decoding and layer compositing.
//!
//! Objects are decoded independently into clipped [`Patch`]es
//! ([`decode::decode_object`]), merged into a [`ClassLayerStack`] with a
//! non-zero-wins rule, and the stack is collapsed into a [`CompositeMask`]
//! by [`composite::composite`] using the configured class priority.

pub mod bitmap;
pub mod composite;
pub mod decode;
pub mod draw;
mod layer;

pub use bitmap::{decode_bitmap, encode_bitmap, BitMask, MAX_BITMAP_SIDE, MAX_INFLATED_BYTES};
pub use composite::composite;
pub use decode::{decode_object, place_bitmap, DecodedObject};
pub use draw::{rasterize_points, rasterize_polygon, Footprint};
pub use layer::{ClassLayerStack, CompositeMask, Patch};
