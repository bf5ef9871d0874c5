//! Probe test specification and results.

use std::time::Duration;

use wms_common::{BoundingBox, WmsEndpoint};

/// Protocol parameters shared by every request of a batch. Copied by value
/// into each test so layer clones cannot alias each other's state.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    pub service: String,
    pub version: String,
    pub request: String,
    pub srs: String,
    pub format: String,
    /// Additional caller-supplied query parameters, appended in order.
    pub extra: Vec<(String, String)>,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            service: "WMS".to_string(),
            version: "1.1.0".to_string(),
            request: "GetMap".to_string(),
            srs: "EPSG:4326".to_string(),
            format: "image/png".to_string(),
            extra: Vec::new(),
        }
    }
}

impl RequestParams {
    pub fn with_overrides(extra: &[(String, String)]) -> Self {
        Self {
            extra: extra.to_vec(),
            ..Self::default()
        }
    }
}

/// One GetMap probe: a single layer, fixed image dimensions and one
/// generated bounding box against a server endpoint.
#[derive(Debug, Clone)]
pub struct ProbeTest {
    /// Test-class identifier, e.g. "RandomBbox".
    pub label: &'static str,
    pub endpoint: WmsEndpoint,
    pub layer: String,
    pub width: u32,
    pub height: u32,
    pub bbox: BoundingBox,
    pub params: RequestParams,
}

impl ProbeTest {
    pub fn new(
        label: &'static str,
        endpoint: WmsEndpoint,
        layer: &str,
        width: u32,
        height: u32,
        bbox: BoundingBox,
        params: RequestParams,
    ) -> Self {
        Self {
            label,
            endpoint,
            layer: layer.to_string(),
            width,
            height,
            bbox,
            params,
        }
    }

    /// The sibling test for another layer over identical geography.
    pub fn clone_for_layer(&self, layer: &str) -> Self {
        let mut test = self.clone();
        test.layer = layer.to_string();
        test
    }

    /// Render the full GetMap request URL.
    pub fn request_url(&self) -> String {
        let p = &self.params;
        let mut url = format!(
            "{}?service={}&version={}&request={}&srs={}&format={}&layers={}&width={}&height={}&bbox={}",
            self.endpoint.http_url(),
            p.service,
            p.version,
            p.request,
            p.srs,
            p.format,
            self.layer,
            self.width,
            self.height,
            self.bbox.to_wms_string()
        );
        for (key, value) in &p.extra {
            url.push_str(&format!("&{}={}", key, value));
        }
        url
    }
}

/// What happened to one probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// The request completed; latency and status were recorded.
    Success {
        status: u16,
        content_type: String,
        elapsed: Duration,
    },
    /// Dry run: no network call was made.
    DryRun,
    /// The request failed (after the single transient retry, if any).
    Failed { reason: String },
}

/// The record produced by executing one `ProbeTest`. Read-only after
/// creation; reported to the sink exactly once.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub label: &'static str,
    pub layer: String,
    pub url: String,
    pub bbox: BoundingBox,
    pub outcome: ProbeOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_probe() -> ProbeTest {
        ProbeTest::new(
            "RandomBbox",
            WmsEndpoint::new("localhost", 7600, "/wms"),
            "osm:roads",
            768,
            384,
            BoundingBox::new(-10.0, -5.0, 10.0, 5.0),
            RequestParams::default(),
        )
    }

    #[test]
    fn test_request_url() {
        let url = test_probe().request_url();
        assert_eq!(
            url,
            "http://localhost:7600/wms?service=WMS&version=1.1.0&request=GetMap\
             &srs=EPSG:4326&format=image/png&layers=osm:roads&width=768&height=384\
             &bbox=-10,-5,10,5"
        );
    }

    #[test]
    fn test_extra_params_are_appended() {
        let mut probe = test_probe();
        probe.params.extra.push(("transparent".to_string(), "true".to_string()));
        assert!(probe.request_url().ends_with("&bbox=-10,-5,10,5&transparent=true"));
    }

    #[test]
    fn test_clone_for_layer_keeps_geography() {
        let probe = test_probe();
        let clone = probe.clone_for_layer("osm:buildings");
        assert_eq!(clone.layer, "osm:buildings");
        assert_eq!(clone.bbox, probe.bbox);
        assert_eq!(clone.params, probe.params);
        assert_eq!(clone.width, probe.width);
    }
}
