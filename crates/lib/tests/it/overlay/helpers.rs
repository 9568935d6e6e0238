use std::any::Any;

use palimpsest::{
    Delegate, Encoder, Slot, StandardDelegate, Value,
    codec::ValueKind,
    overlay::{Encodable, Parent},
};

/// A 2D point stored as `{"@type": "point", "x": .., "y": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Encodable for Point {
    fn encode_to(&self, encoder: &mut Encoder) -> palimpsest::Result<()> {
        encoder.begin_map(3)?;
        encoder.write_key("@type")?;
        encoder.write_str("point")?;
        encoder.write_key("x")?;
        encoder.write_int(self.x)?;
        encoder.write_key("y")?;
        encoder.write_int(self.y)?;
        encoder.end_map()?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "point"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Materializes tagged maps as [`Point`]s and everything else the standard way.
#[derive(Debug, Default)]
pub struct PointDelegate;

impl Delegate for PointDelegate {
    fn to_native(
        &self,
        slot: &Slot,
        parent: Parent<'_>,
        cache: &mut bool,
    ) -> palimpsest::Result<Value> {
        if let Some(raw) = slot.encoded() {
            let tagged = raw.kind() == ValueKind::Map
                && raw.get("@type").and_then(|t| t.as_str().map(|s| s == "point")) == Some(true);
            if tagged {
                *cache = true;
                let coord = |name: &str| raw.get(name).and_then(|v| v.as_int()).unwrap_or_default();
                return Ok(Value::custom(Point {
                    x: coord("x"),
                    y: coord("y"),
                }));
            }
        }
        StandardDelegate.to_native(slot, parent, cache)
    }
}
