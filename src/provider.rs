use std::io::Read as _;

use serde::Deserialize;

use crate::{
    config::PipelineConfig,
    error::{DrivelapseError, DrivelapseResult},
    track::TrackPoint,
};

/// Hard ceiling on a single fetched image; a well-formed provider response is
/// a few hundred KiB.
const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// Fully determines one provider request.
#[derive(Clone, Debug, PartialEq)]
pub struct PanoramaQuery {
    pub lat: f64,
    pub lon: f64,
    /// `None` when no bearing is defined (single-point route); the provider
    /// then picks its own default heading.
    pub heading: Option<f64>,
    pub radius: u32,
    pub fov: u32,
    pub pitch: i32,
    pub width: u32,
    pub height: u32,
}

impl PanoramaQuery {
    pub fn for_point(cfg: &PipelineConfig, point: TrackPoint, heading: Option<f64>) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            heading,
            radius: cfg.radius,
            fov: cfg.fov,
            pitch: cfg.pitch,
            width: cfg.image_width,
            height: cfg.image_height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanoStatus {
    Ok,
    /// No panorama within the search radius.
    ZeroResults,
    /// Any other provider status (quota, auth, malformed request, ...).
    Other(String),
}

impl PanoStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "OK" => Self::Ok,
            "ZERO_RESULTS" | "NOT_FOUND" => Self::ZeroResults,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

#[derive(Clone, Debug)]
pub struct PanoramaMetadata {
    pub status: PanoStatus,
    pub pano_id: Option<String>,
}

/// The imagery provider seam. The pipeline only ever talks to this trait;
/// tests substitute a scripted implementation.
pub trait ImageryProvider {
    fn fetch_metadata(&self, query: &PanoramaQuery) -> DrivelapseResult<PanoramaMetadata>;
    fn fetch_image(&self, query: &PanoramaQuery) -> DrivelapseResult<Vec<u8>>;
}

#[derive(Deserialize)]
struct MetadataDoc {
    status: String,
    #[serde(default)]
    pano_id: Option<String>,
}

/// Blocking HTTP client for the Street View Static API.
///
/// One metadata lookup plus at most one image fetch per route point, issued
/// strictly one at a time; the agent-level timeout turns a hung request into
/// an ordinary skipped point.
pub struct StreetViewProvider {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl StreetViewProvider {
    pub fn new(cfg: &PipelineConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(cfg.timeout).build();
        Self {
            agent,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        }
    }

    /// Query parameters go through the request builder so every value is
    /// percent-encoded; no string templating.
    fn apply_query(&self, mut req: ureq::Request, q: &PanoramaQuery) -> ureq::Request {
        req = req
            .query("size", &format!("{}x{}", q.width, q.height))
            .query("location", &format!("{},{}", q.lat, q.lon))
            .query("fov", &q.fov.to_string())
            .query("pitch", &q.pitch.to_string())
            .query("radius", &q.radius.to_string())
            .query("source", "outdoor")
            .query("key", &self.api_key);
        if let Some(heading) = q.heading {
            req = req.query("heading", &format!("{heading:.4}"));
        }
        req
    }
}

impl ImageryProvider for StreetViewProvider {
    fn fetch_metadata(&self, query: &PanoramaQuery) -> DrivelapseResult<PanoramaMetadata> {
        let req = self.agent.get(&format!("{}/metadata", self.base_url));
        let resp = self
            .apply_query(req, query)
            .call()
            .map_err(|e| DrivelapseError::provider(format!("metadata request failed: {e}")))?;

        let doc: MetadataDoc = resp
            .into_json()
            .map_err(|e| DrivelapseError::provider(format!("metadata response not JSON: {e}")))?;

        Ok(PanoramaMetadata {
            status: PanoStatus::parse(&doc.status),
            pano_id: doc.pano_id,
        })
    }

    fn fetch_image(&self, query: &PanoramaQuery) -> DrivelapseResult<Vec<u8>> {
        let req = self.agent.get(&self.base_url);
        let resp = self
            .apply_query(req, query)
            .call()
            .map_err(|e| DrivelapseError::provider(format!("image request failed: {e}")))?;

        let mut bytes = Vec::new();
        resp.into_reader()
            .take(MAX_IMAGE_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| DrivelapseError::provider(format!("image body read failed: {e}")))?;
        Ok(bytes)
    }
}
