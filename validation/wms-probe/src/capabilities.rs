//! WMS GetCapabilities client for verifying layer names before a run.

use anyhow::{anyhow, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use wms_common::WmsEndpoint;

/// Fetch the capabilities document and return the advertised layer names.
pub async fn query_layer_names(endpoint: &WmsEndpoint) -> Result<Vec<String>> {
    let url = format!("{}?service=WMS&request=GetCapabilities", endpoint.http_url());

    let response = reqwest::get(&url).await?;
    let xml = response.text().await?;

    parse_layer_names(&xml)
}

/// Parse `<Layer><Name>` elements from a GetCapabilities document.
fn parse_layer_names(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut layer_depth = 0usize;
    let mut capture_name = false;
    let mut names = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"Layer" => layer_depth += 1,
                // Only a Name directly announcing a layer counts; styles and
                // the service block carry Name elements too.
                b"Name" if layer_depth > 0 => capture_name = true,
                _ => {}
            },
            Ok(Event::Text(t)) if capture_name => {
                names.push(t.unescape()?.into_owned());
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"Layer" => layer_depth = layer_depth.saturating_sub(1),
                b"Name" => capture_name = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "XML parsing error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}
