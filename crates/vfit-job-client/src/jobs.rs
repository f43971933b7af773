//! Job variant catalog.
//!
//! Each of the six job kinds binds a required-field contract to a wire
//! encoding. Variants are selected once at client construction through the
//! [`JobCatalog`]; encoding and decoding are pure functions over the
//! caller-supplied input and the server response body.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::DynamicImage;
use serde_json::{json, Value};
use vfit_image::ImageSource;

use crate::error::{JobError, JobResult};
use crate::types::{Payload, SuccessBody};

const MODEL_PART: &str = "model_img_buffer";
const CLOTH_PART: &str = "cloth_img_buffer";
const MASK_PART: &str = "mask_img_buffer";

/// The fixed set of job kinds a server can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Face,
    Mask,
    TryOn,
    HandsFix,
    Retouch,
    ModelGeneration,
}

impl JobKind {
    pub const ALL: [JobKind; 6] = [
        JobKind::Face,
        JobKind::Mask,
        JobKind::TryOn,
        JobKind::HandsFix,
        JobKind::Retouch,
        JobKind::ModelGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Face => "face_job",
            JobKind::Mask => "mask_job",
            JobKind::TryOn => "tryon_job",
            JobKind::HandsFix => "handsfix_job",
            JobKind::Retouch => "retouch_job",
            JobKind::ModelGeneration => "model_generation_job",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "face_job" => Ok(JobKind::Face),
            "mask_job" => Ok(JobKind::Mask),
            "tryon_job" => Ok(JobKind::TryOn),
            "handsfix_job" => Ok(JobKind::HandsFix),
            "retouch_job" => Ok(JobKind::Retouch),
            "model_generation_job" => Ok(JobKind::ModelGeneration),
            other => Err(JobError::unknown_job_type(other)),
        }
    }
}

/// A single field value of a job input.
#[derive(Debug, Clone)]
pub enum InputValue {
    /// An image in any supported representation.
    Image(ImageSource),
    /// A string scalar.
    Text(String),
    /// An integer scalar (seeds).
    Int(i64),
    /// A structured JSON value (inpainting parameters).
    Json(Value),
    /// An explicitly null value (the optional try-on mask).
    Null,
}

/// Caller-supplied job input: a mapping from field name to value.
///
/// Read-only to the client; each variant validates its own required fields
/// at encode time, before any network activity.
#[derive(Debug, Clone, Default)]
pub struct JobInput {
    fields: HashMap<String, InputValue>,
}

impl JobInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: InputValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_image(self, name: impl Into<String>, image: impl Into<ImageSource>) -> Self {
        self.with(name, InputValue::Image(image.into()))
    }

    pub fn with_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with(name, InputValue::Text(text.into()))
    }

    pub fn with_int(self, name: impl Into<String>, value: i64) -> Self {
        self.with(name, InputValue::Int(value))
    }

    pub fn with_json(self, name: impl Into<String>, value: Value) -> Self {
        self.with(name, InputValue::Json(value))
    }

    pub fn with_null(self, name: impl Into<String>) -> Self {
        self.with(name, InputValue::Null)
    }

    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.fields.get(name)
    }

    fn require(&self, name: &str) -> JobResult<&InputValue> {
        self.fields
            .get(name)
            .ok_or_else(|| JobError::invalid_input(format!("missing '{name}' field in job input")))
    }

    fn require_image(&self, name: &str) -> JobResult<&ImageSource> {
        match self.require(name)? {
            InputValue::Image(source) => Ok(source),
            _ => Err(JobError::invalid_input(format!(
                "field '{name}' must be an image"
            ))),
        }
    }

    /// An image field whose value may be explicitly null.
    ///
    /// The field itself must still be present.
    fn require_nullable_image(&self, name: &str) -> JobResult<Option<&ImageSource>> {
        match self.require(name)? {
            InputValue::Image(source) => Ok(Some(source)),
            InputValue::Null => Ok(None),
            _ => Err(JobError::invalid_input(format!(
                "field '{name}' must be an image or null"
            ))),
        }
    }

    fn require_text(&self, name: &str) -> JobResult<&str> {
        match self.require(name)? {
            InputValue::Text(text) => Ok(text),
            _ => Err(JobError::invalid_input(format!(
                "field '{name}' must be a string"
            ))),
        }
    }

    /// A required field as a JSON value for the metadata blob.
    fn require_value(&self, name: &str) -> JobResult<Value> {
        match self.require(name)? {
            InputValue::Text(text) => Ok(Value::String(text.clone())),
            InputValue::Int(n) => Ok(json!(n)),
            InputValue::Json(value) => Ok(value.clone()),
            InputValue::Null => Ok(Value::Null),
            InputValue::Image(_) => Err(JobError::invalid_input(format!(
                "field '{name}' must not be an image"
            ))),
        }
    }

    /// An optional integer field; absent and null both read as `None`.
    fn optional_int(&self, name: &str) -> JobResult<Option<i64>> {
        match self.fields.get(name) {
            None | Some(InputValue::Null) => Ok(None),
            Some(InputValue::Int(n)) => Ok(Some(*n)),
            Some(_) => Err(JobError::invalid_input(format!(
                "field '{name}' must be an integer"
            ))),
        }
    }
}

fn encode_face(input: &JobInput) -> JobResult<Payload> {
    let model = input.require_image("model_img")?;
    let generation_type = input.require_text("generation_type")?;
    let inpaint_params = input.require_value("inpaint_params")?;
    let prompt = input.require_text("prompt")?;

    let mut payload = Payload::new();
    payload.attach(MODEL_PART, "model.png", model.to_png_bytes()?);
    payload.set_metadata(json!({
        "inpaint_params": inpaint_params,
        "generation_type": generation_type,
        "prompt": prompt,
    }));
    Ok(payload)
}

fn encode_mask(input: &JobInput) -> JobResult<Payload> {
    let category = input.require_text("category")?;
    let model = input.require_image("model_img")?;

    let mut payload = Payload::new();
    payload.attach(MODEL_PART, "model.png", model.to_png_bytes()?);
    payload.set_metadata(json!({ "category": category }));
    Ok(payload)
}

fn encode_tryon(input: &JobInput) -> JobResult<Payload> {
    let category = input.require_text("category")?;
    let model = input.require_image("model_img")?;
    let cloth = input.require_image("cloth_img")?;
    let mask = input.require_nullable_image("mask_img")?;

    let mut payload = Payload::new();
    payload.attach(MODEL_PART, "model.png", model.to_png_bytes()?);
    payload.attach(CLOTH_PART, "cloth.png", cloth.to_png_bytes()?);
    // A null mask still occupies its attachment slot, with empty content.
    let mask_bytes = match mask {
        Some(source) => source.to_png_bytes()?,
        None => Vec::new(),
    };
    payload.attach(MASK_PART, "mask.png", mask_bytes);
    payload.set_metadata(json!({ "category": category }));
    Ok(payload)
}

fn encode_handsfix(input: &JobInput) -> JobResult<Payload> {
    let model = input.require_image("model_img")?;

    let mut payload = Payload::new();
    payload.attach(MODEL_PART, "model.png", model.to_png_bytes()?);
    Ok(payload)
}

fn encode_retouch(input: &JobInput) -> JobResult<Payload> {
    let model = input.require_image("model_img")?;
    let seed = input.optional_int("seed")?;

    let mut payload = Payload::new();
    payload.attach(MODEL_PART, "model.png", model.to_png_bytes()?);
    payload.set_metadata(json!({ "seed": seed }));
    Ok(payload)
}

fn encode_model_generation(input: &JobInput) -> JobResult<Payload> {
    let prompt = input.require_text("prompt")?;
    let seed = input.optional_int("seed")?;

    let mut payload = Payload::new();
    payload.set_metadata(json!({ "prompt": prompt, "seed": seed }));
    Ok(payload)
}

/// Decode a success body into the result image.
///
/// All variants share the same result shape: a base64-encoded image in the
/// `result` field.
fn decode_result(body: &SuccessBody) -> JobResult<DynamicImage> {
    let encoded = body
        .result
        .as_deref()
        .ok_or_else(|| JobError::decode("response body is missing the 'result' field"))?;
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| JobError::decode(format!("result field is not valid base64: {e}")))?;
    image::load_from_memory(&bytes)
        .map_err(|e| JobError::decode(format!("result bytes are not a valid image: {e}")))
}

pub type EncodeFn = fn(&JobInput) -> JobResult<Payload>;
pub type DecodeFn = fn(&SuccessBody) -> JobResult<DynamicImage>;

/// The encode/decode function pair for one job kind.
#[derive(Clone, Copy, Debug)]
pub struct JobStrategy {
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

/// Registry of job strategies, built once at process start and passed into
/// each client.
pub struct JobCatalog {
    strategies: HashMap<JobKind, JobStrategy>,
}

impl JobCatalog {
    /// The standard catalog covering all six job kinds.
    pub fn standard() -> Self {
        let mut strategies = HashMap::new();
        for kind in JobKind::ALL {
            let encode: EncodeFn = match kind {
                JobKind::Face => encode_face,
                JobKind::Mask => encode_mask,
                JobKind::TryOn => encode_tryon,
                JobKind::HandsFix => encode_handsfix,
                JobKind::Retouch => encode_retouch,
                JobKind::ModelGeneration => encode_model_generation,
            };
            strategies.insert(
                kind,
                JobStrategy {
                    encode,
                    decode: decode_result,
                },
            );
        }
        Self { strategies }
    }

    /// Resolve a job type tag to its kind and strategy.
    pub fn resolve(&self, tag: &str) -> JobResult<(JobKind, JobStrategy)> {
        let kind: JobKind = tag.parse()?;
        let strategy = self
            .strategies
            .get(&kind)
            .copied()
            .ok_or_else(|| JobError::unknown_job_type(tag))?;
        Ok((kind, strategy))
    }

    pub fn strategy(&self, kind: JobKind) -> Option<JobStrategy> {
        self.strategies.get(&kind).copied()
    }
}

impl Default for JobCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
