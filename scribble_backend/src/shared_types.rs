use serde::{Deserialize, Serialize};

// One drawing stroke segment as exchanged over the wire.
// The relay never parses it; clients and tests do.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct DrawingMessage {
    // Endpoints as fractions of the sending client's canvas size at emit
    // time. Usually inside [0,1] but not clamped: a sender with a larger
    // canvas may produce values outside a smaller receiver's canvas.
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// CSS-style color token, e.g. "#0000ff".
    pub color: String,
    /// Stroke width in the sender's pixel units. Not every client variant
    /// sends it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}
