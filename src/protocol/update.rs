// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of SysAP update payloads.
//!
//! An update item carries an XML-escaped project document. Only the output
//! datapoints are of interest:
//!
//! ```text
//! <project>
//!   <devices>
//!     <device serialNumber="ABB700D12345">
//!       <channels>
//!         <channel i="ch0000">
//!           <outputs>
//!             <dataPoint i="odp0000"><value>1</value></dataPoint>
//!           </outputs>
//!         </channel>
//!       </channels>
//!     </device>
//!   </devices>
//! </project>
//! ```
//!
//! Decoding yields one result per datapoint so a single broken leaf does not
//! take its siblings down with it.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::DecodeError;

/// Pubsub node carrying update events.
pub const UPDATE_NAMESPACE: &str = "http://abb.com/protocol/update";

/// One datapoint value reported by the SysAP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatapointUpdate {
    /// Device serial number.
    pub serial: String,
    /// Channel id.
    pub channel: String,
    /// Datapoint id.
    pub datapoint: String,
    /// Raw value string.
    pub value: String,
}

/// Reverses the XML escaping applied to the update payload.
///
/// # Errors
///
/// Returns `DecodeError::Escape` for unknown or unterminated entities.
pub fn unescape_payload(data: &str) -> Result<Cow<'_, str>, DecodeError> {
    quick_xml::escape::unescape(data).map_err(|e| DecodeError::Escape(e.to_string()))
}

/// Unescapes and decodes an update item payload.
///
/// Returns a single error if the payload cannot be unescaped, otherwise one
/// result per output datapoint.
#[must_use]
pub fn decode_update(data: &str) -> Vec<Result<DatapointUpdate, DecodeError>> {
    match unescape_payload(data) {
        Ok(xml) => decode_project(&xml),
        Err(e) => vec![Err(e)],
    }
}

/// Decodes a project document into its output datapoints.
///
/// Well-formed leaves that precede a syntax error are kept; the syntax error
/// is appended as the last result.
#[must_use]
pub fn decode_project(xml: &str) -> Vec<Result<DatapointUpdate, DecodeError>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut device: Option<Option<String>> = None;
    let mut channel: Option<Option<String>> = None;
    let mut in_outputs = false;
    let mut pending: Option<PendingDatapoint> = None;
    let mut in_value = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"device" => device = Some(attribute(&e, b"serialNumber")),
                b"channel" if device.is_some() => channel = Some(attribute(&e, b"i")),
                b"outputs" if channel.is_some() => in_outputs = true,
                b"dataPoint" if in_outputs => {
                    pending = Some(PendingDatapoint::new(attribute(&e, b"i")));
                }
                b"value" if pending.is_some() => in_value = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"dataPoint" if in_outputs => {
                    let leaf = PendingDatapoint::new(attribute(&e, b"i"));
                    results.push(leaf.finish(device.as_ref(), channel.as_ref()));
                }
                b"value" => {
                    if let Some(leaf) = pending.as_mut() {
                        leaf.value.get_or_insert_with(String::new);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_value => {
                if let Some(leaf) = pending.as_mut() {
                    match t.unescape() {
                        Ok(text) => leaf.value = Some(text.into_owned()),
                        Err(e) => leaf.error = Some(DecodeError::Escape(e.to_string())),
                    }
                }
            }
            Ok(Event::CData(c)) if in_value => {
                if let Some(leaf) = pending.as_mut() {
                    leaf.value = Some(String::from_utf8_lossy(&c.into_inner()).into_owned());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"value" if in_value => {
                    in_value = false;
                    if let Some(leaf) = pending.as_mut() {
                        leaf.value.get_or_insert_with(String::new);
                    }
                }
                b"dataPoint" => {
                    if let Some(leaf) = pending.take() {
                        results.push(leaf.finish(device.as_ref(), channel.as_ref()));
                    }
                }
                b"outputs" => in_outputs = false,
                b"channel" => channel = None,
                b"device" => device = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                results.push(Err(DecodeError::Xml(format!(
                    "at position {}: {e}",
                    reader.error_position()
                ))));
                break;
            }
        }
    }

    results
}

/// Reads an attribute value, treating unreadable attributes as absent.
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    let attr = element.try_get_attribute(name).ok().flatten()?;
    attr.unescape_value().ok().map(Cow::into_owned)
}

/// A datapoint whose closing tag has not been seen yet.
#[derive(Debug)]
struct PendingDatapoint {
    id: Option<String>,
    value: Option<String>,
    error: Option<DecodeError>,
}

impl PendingDatapoint {
    fn new(id: Option<String>) -> Self {
        Self {
            id,
            value: None,
            error: None,
        }
    }

    fn finish(
        self,
        device: Option<&Option<String>>,
        channel: Option<&Option<String>>,
    ) -> Result<DatapointUpdate, DecodeError> {
        let serial = device.cloned().flatten();
        let channel = channel.cloned().flatten();
        let context = format!(
            "{}/{}/{}",
            serial.as_deref().unwrap_or("?"),
            channel.as_deref().unwrap_or("?"),
            self.id.as_deref().unwrap_or("?"),
        );

        if let Some(error) = self.error {
            return Err(error);
        }
        let missing = |field| DecodeError::MissingField {
            context: context.clone(),
            field,
        };
        Ok(DatapointUpdate {
            serial: serial.ok_or_else(|| missing("serialNumber"))?,
            channel: channel.ok_or_else(|| missing("channel id"))?,
            datapoint: self.id.ok_or_else(|| missing("datapoint id"))?,
            value: self.value.ok_or_else(|| missing("value"))?,
        })
    }
}
