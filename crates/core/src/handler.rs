//! Routing and shaping of `/chunk` requests.

use crate::sampler::{RegionSampler, SampleError};
use proto::response::{self, JsonResponse};
use proto::{ChunkRequest, Method, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Path of the sampling endpoint.
pub const CHUNK_PATH: &str = "/chunk";

/// Answers requests against one [`RegionSampler`].
///
/// Sampling is gated on `ready`; until the flag is set every valid request is
/// answered with 503.
pub struct ChunkHandler {
    sampler: RegionSampler,
    ready: Arc<AtomicBool>,
}

impl ChunkHandler {
    pub fn new(sampler: RegionSampler, ready: Arc<AtomicBool>) -> Self {
        Self { sampler, ready }
    }

    #[inline]
    pub fn sampler(&self) -> &RegionSampler {
        &self.sampler
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Route one request. Never fails; every error becomes a response.
    ///
    /// `url` is the request target; a query string is ignored.
    pub fn handle(&self, method: &Method, url: &str, body: &[u8]) -> JsonResponse {
        let path = url.split_once('?').map_or(url, |(path, _)| path);
        if path != CHUNK_PATH {
            return JsonResponse::error(response::NOT_FOUND, format!("No route for {path}"));
        }

        if *method != Method::Post {
            return JsonResponse::error(
                response::METHOD_NOT_ALLOWED,
                format!("{method} is not allowed on {CHUNK_PATH}"),
            );
        }

        let body: serde_json::Value = match serde_json::from_slice(body) {
            Ok(body) => body,
            Err(e) => {
                warn!("Rejected malformed request body: {e}");
                return JsonResponse::error(response::BAD_REQUEST, format!("Malformed JSON body: {e}"));
            }
        };

        let chunk = match ChunkRequest::from_json(&body) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Rejected chunk request: {e}");
                return JsonResponse::error(response::BAD_REQUEST, e);
            }
        };

        match self.sample(chunk) {
            Ok(columns) => JsonResponse::json(response::OK, &columns)
                .unwrap_or_else(|e| JsonResponse::error(response::INTERNAL_SERVER_ERROR, e)),
            Err(e) => {
                warn!("Chunk request at ({}, {}) failed: {e}", chunk.x_offset, chunk.z_offset);
                JsonResponse::error(sample_status(&e), e)
            }
        }
    }

    /// Sample the region of a validated request.
    pub fn sample(&self, request: ChunkRequest) -> Result<Vec<String>, SampleError> {
        if !self.is_ready() {
            return Err(SampleError::NotReady);
        }

        debug!("Sampling region at ({}, {})", request.x_offset, request.z_offset);
        self.sampler.sample(request.x_offset, request.z_offset)
    }
}

fn sample_status(error: &SampleError) -> StatusCode {
    match error {
        SampleError::NotReady => response::SERVICE_UNAVAILABLE,
        SampleError::MissingSettings(_) | SampleError::Generation(_) => response::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldgen::{
        ChunkPos, HeightRange, Identifier, ProtoChunk, TerrainEngine, TerrainGenerator, WorldgenError,
    };

    struct StoneGenerator;

    impl TerrainGenerator for StoneGenerator {
        fn height_range(&self) -> HeightRange {
            HeightRange { min_y: 0, height: 2 }
        }

        fn materialize(&self, pos: ChunkPos) -> ProtoChunk {
            let mut chunk = ProtoChunk::new(pos, self.height_range());
            for x in 0..16 {
                for z in 0..16 {
                    chunk.set_block_state(x, 0, z, &worldgen::BlockState::vanilla("stone"));
                }
            }
            chunk
        }
    }

    /// Knows a single settings entry, `minecraft:overworld`.
    struct StoneEngine;

    impl TerrainEngine for StoneEngine {
        fn prepare(&self, _seed: u64, settings: &Identifier) -> worldgen::Result<Box<dyn TerrainGenerator>> {
            if settings.path() == "overworld" {
                Ok(Box::new(StoneGenerator))
            } else {
                Err(WorldgenError::MissingSettings(settings.clone()))
            }
        }
    }

    fn handler(settings: &str, ready: bool) -> ChunkHandler {
        let sampler = RegionSampler::new(Arc::new(StoneEngine), Identifier::parse(settings).unwrap(), 1, 16);
        ChunkHandler::new(sampler, Arc::new(AtomicBool::new(ready)))
    }

    fn error_of(response: &JsonResponse) -> String {
        serde_json::from_slice::<proto::ErrorBody>(&response.body).unwrap().error
    }

    #[test]
    fn test_success() {
        let handler = handler("minecraft:overworld", true);
        let response = handler.handle(&Method::Post, "/chunk", br#"{"xOffset": 0, "zOffset": 0}"#);

        assert_eq!(response.status, response::OK);
        let columns: Vec<String> = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(columns.len(), 256);
        assert!(columns.iter().all(|c| c == "stone,air,"));
    }

    #[test]
    fn test_validation() {
        let handler = handler("minecraft:overworld", true);

        let response = handler.handle(&Method::Post, "/chunk", br#"{"xOffset": "a", "zOffset": 0}"#);
        assert_eq!(response.status, response::BAD_REQUEST);
        assert_eq!(error_of(&response), "xOffset must be an integer");

        let response = handler.handle(&Method::Post, "/chunk", b"{}");
        assert_eq!(response.status, response::BAD_REQUEST);
        assert_eq!(error_of(&response), "xOffset and zOffset must be integers");

        let response = handler.handle(&Method::Post, "/chunk", b"{ not json");
        assert_eq!(response.status, response::BAD_REQUEST);
        assert!(error_of(&response).starts_with("Malformed JSON body"));
    }

    #[test]
    fn test_validation_precedes_readiness() {
        let handler = handler("minecraft:overworld", false);

        let response = handler.handle(&Method::Post, "/chunk", br#"{"zOffset": 0}"#);
        assert_eq!(response.status, response::BAD_REQUEST);

        let response = handler.handle(&Method::Post, "/chunk", br#"{"xOffset": 0, "zOffset": 0}"#);
        assert_eq!(response.status, response::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_missing_settings() {
        let handler = handler("minecraft:nether", true);
        let response = handler.handle(&Method::Post, "/chunk", br#"{"xOffset": 0, "zOffset": 0}"#);

        assert_eq!(response.status, response::INTERNAL_SERVER_ERROR);
        assert!(error_of(&response).contains("minecraft:nether"));
    }

    #[test]
    fn test_routing() {
        let handler = handler("minecraft:overworld", true);

        let response = handler.handle(&Method::Get, "/chunk", b"");
        assert_eq!(response.status, response::METHOD_NOT_ALLOWED);

        let response = handler.handle(&Method::Post, "/region", b"{}");
        assert_eq!(response.status, response::NOT_FOUND);

        let body = br#"{"xOffset": 0, "zOffset": 0}"#;
        let response = handler.handle(&Method::Post, "/chunk?verbose=1", body);
        assert_eq!(response.status, response::OK);
    }
}
