use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

use crate::beads::BeadPalette;
use crate::options::{MatchStrategy, MosaicOptions, ReductionMode};

/// Convert an RGBA pixel buffer (as from `ImageData.data`) into a bead board.
///
/// Returns `{ pixels: Uint8Array, palette: string[], colorCounts: {name: n} }`.
/// An unknown `mode` falls back to `standard`; an unknown `strategy` is an error.
#[wasm_bindgen(js_name = quantizeImage)]
pub fn quantize_image_js(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    mode: Option<String>,
    strategy: Option<String>,
    preprocess: Option<bool>,
) -> Result<Object, JsValue> {
    let strategy = match strategy {
        Some(s) => s.parse::<MatchStrategy>().map_err(|e| JsValue::from_str(&e))?,
        None => MatchStrategy::default(),
    };
    let options = MosaicOptions {
        mode: mode.as_deref().map(ReductionMode::parse).unwrap_or_default(),
        strategy,
        preprocess: preprocess.unwrap_or(true),
    };

    let result = crate::quantize_raw(width, height, pixels, &options)
        .map_err(|e| JsValue::from_str(&format!("Unable to build mosaic: {e}")))?;

    let palette_js = Array::new();
    for name in &result.palette {
        palette_js.push(&JsValue::from_str(name));
    }

    let counts_js = Object::new();
    for (name, count) in result.color_counts.iter() {
        Reflect::set(&counts_js, &JsValue::from_str(name), &JsValue::from(count))?;
    }

    let out = Object::new();
    Reflect::set(&out, &JsValue::from_str("pixels"), &Uint8Array::from(result.image.as_raw().as_slice()))?;
    Reflect::set(&out, &JsValue::from_str("palette"), &palette_js)?;
    Reflect::set(&out, &JsValue::from_str("colorCounts"), &counts_js)?;
    Ok(out)
}

/// The standard bead table as `[{ name, hex }]`, in table order.
#[wasm_bindgen(js_name = beadPalette)]
pub fn bead_palette_js() -> Result<Array, JsValue> {
    let out = Array::new();
    for entry in BeadPalette::standard().entries() {
        let item = Object::new();
        let hex = format!("{:02X}{:02X}{:02X}", entry.rgb.red, entry.rgb.green, entry.rgb.blue);
        Reflect::set(&item, &JsValue::from_str("name"), &JsValue::from_str(entry.name))?;
        Reflect::set(&item, &JsValue::from_str("hex"), &JsValue::from_str(&hex))?;
        out.push(&item);
    }
    Ok(out)
}
