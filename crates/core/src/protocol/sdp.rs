//! SDP (Session Description Protocol) generation (RFC 4566 / RFC 8866).
//!
//! Produces the SDP body returned by DESCRIBE responses, built
//! deterministically from a [`ResourceDescription`], the request's host,
//! and a [`ServerIdentity`] — no other inputs affect the output except
//! the injected "now" timestamp used for the `o=` line.
//!
//! ```text
//! v=0
//! o=- <sess-id> <sess-ver> IN IP4 <host>
//! s=<name>
//! c=IN IP4 <addr-or-multicast/ttl>
//! t=0 0
//! a=type:broadcast
//! a=tool:<package> <version> Streaming Server
//! a=control:*
//! a=range:npt=0-<duration>                 (if duration > 0)
//! m=<kind> <port> RTP/AVP <payload-types...>
//! a=control:TrackID=<percent-encoded name>
//! a=framerate:<fps>                        (video only, if > 0)
//! a=fmtp:/a=rtpmap: ...                    (per private field)
//! a=uriLicense:/a=uriMetadata:/a=title:/a=author:  (if present)
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::resource::{MediaDescriptionGroup, MediaKind, PrivateFieldKind, ResourceDescription};

/// RFC 3986 "unreserved" characters are preserved; everything else is
/// percent-encoded. `NON_ALPHANUMERIC` encodes every non-alphanumeric
/// byte, so the unreserved punctuation (`-`, `.`, `_`, `~`) is carved
/// back out.
const TRACK_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const EL: &str = "\r\n";

/// Host portion of the request URL, used in the `o=`/`c=` lines.
pub struct RequestUrl<'a> {
    pub host: &'a str,
}

/// Server identification used in the `a=tool:` line.
pub struct ServerIdentity<'a> {
    pub package: &'a str,
    pub version: &'a str,
}

fn ntp_time(unix_seconds: u64) -> f64 {
    unix_seconds as f64 + 2_208_988_800.0
}

/// Build the SDP body for `resource`, as seen from `request_url`.
///
/// `now_unix` is the current time, seconds since the Unix epoch,
/// injected by the caller so this function stays pure and testable —
/// it never reads the system clock itself.
pub fn build_sdp(
    resource: &ResourceDescription,
    request_url: &RequestUrl,
    identity: &ServerIdentity,
    now_unix: u64,
) -> String {
    let mut sdp = String::new();

    sdp.push_str("v=0");
    sdp.push_str(EL);

    let session_id = ntp_time(now_unix);
    let last_change = resource.last_change();
    let session_version = if last_change > 0 {
        ntp_time(last_change)
    } else {
        session_id
    };

    sdp.push_str(&format!(
        "o=- {session_id:.0} {session_version:.0} IN IP4 {}{EL}",
        request_url.host
    ));
    sdp.push_str(&format!(
        "s={}{EL}",
        resource.name().unwrap_or("RTSP Session")
    ));
    if let Some(u) = resource.description_uri() {
        sdp.push_str(&format!("u={u}{EL}"));
    }
    if let Some(e) = resource.email() {
        sdp.push_str(&format!("e={e}{EL}"));
    }
    if let Some(p) = resource.phone() {
        sdp.push_str(&format!("p={p}{EL}"));
    }

    sdp.push_str("c=IN IP4 ");
    match resource.multicast() {
        Some(addr) => sdp.push_str(&format!("{addr}/{}", resource.ttl().unwrap_or("32"))),
        None => sdp.push_str("0.0.0.0"),
    }
    sdp.push_str(EL);

    sdp.push_str("t=0 0");
    sdp.push_str(EL);
    sdp.push_str("a=type:broadcast");
    sdp.push_str(EL);
    sdp.push_str(&format!(
        "a=tool:{} {} Streaming Server{EL}",
        identity.package, identity.version
    ));
    sdp.push_str("a=control:*");
    sdp.push_str(EL);

    if resource.duration() > 0.0 {
        sdp.push_str(&format!("a=range:npt=0-{:.6}{EL}", resource.duration()));
    }

    for field in resource.private_fields() {
        if field.kind == PrivateFieldKind::Empty {
            sdp.push_str(&field.field);
            sdp.push_str(EL);
        }
    }

    for group in resource.media_groups() {
        append_media_block(&mut sdp, group);
    }

    tracing::debug!(bytes = sdp.len(), "built SDP body");
    sdp
}

fn append_media_block(sdp: &mut String, group: &MediaDescriptionGroup) {
    let first = group.first();

    sdp.push_str(&format!("m={} {} RTP/AVP", first.kind().label(), first.rtp_port()));
    for m in group.members() {
        sdp.push_str(&format!(" {}", m.rtp_payload_type()));
    }
    sdp.push_str(EL);

    let encoded_name = utf8_percent_encode(first.name(), TRACK_ID).to_string();
    sdp.push_str(&format!("a=control:TrackID={encoded_name}{EL}"));

    if first.kind() == MediaKind::Video && first.frame_rate() > 0.0 {
        sdp.push_str(&format!("a=framerate:{:.6}{EL}", first.frame_rate()));
    }

    for m in group.members() {
        for field in m.private_fields() {
            match field.kind {
                PrivateFieldKind::Empty => {
                    sdp.push_str(&field.field);
                    sdp.push_str(EL);
                }
                PrivateFieldKind::Fmtp => {
                    sdp.push_str(&format!("a=fmtp:{} {}{EL}", m.rtp_payload_type(), field.field))
                }
                PrivateFieldKind::Rtpmap => sdp.push_str(&format!(
                    "a=rtpmap:{} {}{EL}",
                    m.rtp_payload_type(),
                    field.field
                )),
                PrivateFieldKind::Other => {}
            }
        }
    }

    if let Some(v) = first.commons_deed() {
        sdp.push_str(&format!("a=uriLicense:{v}{EL}"));
    }
    if let Some(v) = first.rdf_page() {
        sdp.push_str(&format!("a=uriMetadata:{v}{EL}"));
    }
    if let Some(v) = first.title() {
        sdp.push_str(&format!("a=title:{v}{EL}"));
    }
    if let Some(v) = first.author() {
        sdp.push_str(&format!("a=author:{v}{EL}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{MediaDescription, SdpField};

    fn video_resource(last_change: u64, duration: f64) -> ResourceDescription {
        let video = MediaDescription::new(
            MediaKind::Video,
            "video0",
            96,
            5004,
            90000,
            25.0,
            "",
            "",
            "",
            "",
        )
        .with_private_fields(vec![SdpField::fmtp("profile-level-id=42e01e")]);
        let group = MediaDescriptionGroup::new(vec![video]).unwrap();

        ResourceDescription::new("Test Stream", "", "", "", "", last_change, duration, "", "")
            .with_media(vec![group])
    }

    #[test]
    fn builds_deterministic_origin_and_media_block() {
        let resource = video_resource(1_000_000_000, 60.0);
        let sdp = build_sdp(
            &resource,
            &RequestUrl { host: "srv.example" },
            &ServerIdentity {
                package: "media-core",
                version: "0.1.0",
            },
            0,
        );

        assert!(sdp.starts_with("v=0\r\n"));
        assert!(sdp.contains("o=- 2208988800 3208988800 IN IP4 srv.example\r\n"));
        assert!(sdp.contains("s=Test Stream\r\n"));
        assert!(sdp.contains("c=IN IP4 0.0.0.0\r\n"));
        assert!(sdp.contains("a=type:broadcast\r\n"));
        assert!(sdp.contains("a=tool:media-core 0.1.0 Streaming Server\r\n"));
        assert!(sdp.contains("a=control:*\r\n"));
        assert!(sdp.contains("a=range:npt=0-60.000000\r\n"));
        assert!(sdp.contains("m=video 5004 RTP/AVP 96\r\n"));
        assert!(sdp.contains("a=control:TrackID=video0\r\n"));
        assert!(sdp.contains("a=framerate:25.000000\r\n"));
        assert!(sdp.contains("a=fmtp:96 profile-level-id=42e01e\r\n"));

        let range_idx = sdp.find("a=range").unwrap();
        let m_idx = sdp.find("m=video").unwrap();
        assert!(range_idx < m_idx);
    }

    #[test]
    fn multicast_address_uses_default_ttl() {
        let video =
            MediaDescription::new(MediaKind::Video, "video0", 96, 5004, 90000, 0.0, "", "", "", "");
        let group = MediaDescriptionGroup::new(vec![video]).unwrap();
        let resource = ResourceDescription::new("Stream", "", "", "", "", 0, 0.0, "239.0.0.1", "")
            .with_media(vec![group]);

        let sdp = build_sdp(
            &resource,
            &RequestUrl { host: "srv" },
            &ServerIdentity {
                package: "media-core",
                version: "0.1.0",
            },
            0,
        );
        assert!(sdp.contains("c=IN IP4 239.0.0.1/32\r\n"));
    }

    #[test]
    fn track_id_is_percent_encoded() {
        let video = MediaDescription::new(
            MediaKind::Video, "cam one", 96, 5004, 90000, 0.0, "", "", "", "",
        );
        let group = MediaDescriptionGroup::new(vec![video]).unwrap();
        let resource =
            ResourceDescription::new("Stream", "", "", "", "", 0, 0.0, "", "").with_media(vec![group]);

        let sdp = build_sdp(
            &resource,
            &RequestUrl { host: "srv" },
            &ServerIdentity {
                package: "media-core",
                version: "0.1.0",
            },
            0,
        );
        assert!(sdp.contains("a=control:TrackID=cam%20one\r\n"));
    }

    #[test]
    fn no_duration_omits_range() {
        let resource = video_resource(0, 0.0);
        let sdp = build_sdp(
            &resource,
            &RequestUrl { host: "srv" },
            &ServerIdentity {
                package: "media-core",
                version: "0.1.0",
            },
            0,
        );
        assert!(!sdp.contains("a=range"));
    }
}
