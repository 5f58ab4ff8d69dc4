//! Resource description model (RFC 4566 terms, not wire format).
//!
//! A [`ResourceDescription`] is a read-only snapshot of a streamable
//! resource: its session-level metadata (name, contact info, multicast
//! address) and the media it carries, grouped into
//! [`MediaDescriptionGroup`]s (one group per alternative rendition of a
//! track — e.g. a video track offered at two payload types).
//!
//! Every accessor is total: absent values come back as `None`/empty
//! rather than as a sentinel string. The empty-string-as-absent
//! convention used by the underlying description store is normalized
//! away at construction time, not at every read.

pub mod registry;

/// Coarse media type, used to pick the SDP `m=` line keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Application,
    Data,
    Control,
}

impl MediaKind {
    /// SDP `m=<kind>` keyword (RFC 4566 §5.14).
    pub fn label(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Application => "application",
            Self::Data => "data",
            Self::Control => "control",
        }
    }
}

/// What kind of `a=` attribute a private SDP field represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivateFieldKind {
    /// Verbatim `a=<field>` line.
    Empty,
    /// `a=fmtp:<payload-type> <field>`.
    Fmtp,
    /// `a=rtpmap:<payload-type> <field>`.
    Rtpmap,
    /// Unrecognized kind; ignored by the SDP builder.
    Other,
}

/// A single extra SDP attribute carried alongside a description,
/// outside the fixed fields this model knows about by name.
#[derive(Debug, Clone)]
pub struct SdpField {
    pub kind: PrivateFieldKind,
    pub field: String,
}

impl SdpField {
    pub fn empty(field: impl Into<String>) -> Self {
        Self {
            kind: PrivateFieldKind::Empty,
            field: field.into(),
        }
    }

    pub fn fmtp(field: impl Into<String>) -> Self {
        Self {
            kind: PrivateFieldKind::Fmtp,
            field: field.into(),
        }
    }

    pub fn rtpmap(field: impl Into<String>) -> Self {
        Self {
            kind: PrivateFieldKind::Rtpmap,
            field: field.into(),
        }
    }
}

fn normalize(s: impl Into<String>) -> Option<String> {
    let s = s.into();
    if s.is_empty() { None } else { Some(s) }
}

/// Description of a single media track within a resource.
#[derive(Debug, Clone)]
pub struct MediaDescription {
    kind: MediaKind,
    /// Track name, used verbatim (percent-encoded by the caller) as the
    /// SDP `TrackID`.
    name: String,
    rtp_payload_type: u8,
    rtp_port: u16,
    clock_rate: u32,
    frame_rate: f64,
    commons_deed: Option<String>,
    rdf_page: Option<String>,
    title: Option<String>,
    author: Option<String>,
    private_fields: Vec<SdpField>,
}

impl MediaDescription {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: MediaKind,
        name: impl Into<String>,
        rtp_payload_type: u8,
        rtp_port: u16,
        clock_rate: u32,
        frame_rate: f64,
        commons_deed: impl Into<String>,
        rdf_page: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            rtp_payload_type,
            rtp_port,
            clock_rate,
            frame_rate,
            commons_deed: normalize(commons_deed),
            rdf_page: normalize(rdf_page),
            title: normalize(title),
            author: normalize(author),
            private_fields: Vec::new(),
        }
    }

    pub fn with_private_fields(mut self, fields: Vec<SdpField>) -> Self {
        self.private_fields = fields;
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rtp_payload_type(&self) -> u8 {
        self.rtp_payload_type
    }

    pub fn rtp_port(&self) -> u16 {
        self.rtp_port
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    /// Frames per second; `0.0` means unknown/not applicable.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn commons_deed(&self) -> Option<&str> {
        self.commons_deed.as_deref()
    }

    pub fn rdf_page(&self) -> Option<&str> {
        self.rdf_page.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn private_fields(&self) -> &[SdpField] {
        &self.private_fields
    }
}

/// A non-empty group of [`MediaDescription`]s sharing one RTP port —
/// alternative payload-type encodings of the same track.
#[derive(Debug, Clone)]
pub struct MediaDescriptionGroup(Vec<MediaDescription>);

impl MediaDescriptionGroup {
    /// Builds a group, checking the invariants the SDP builder relies
    /// on: non-empty, every member shares the group's RTP port, and
    /// payload types are unique within the group.
    pub fn new(members: Vec<MediaDescription>) -> crate::error::Result<Self> {
        use crate::error::RtspError;

        let Some(first) = members.first() else {
            return Err(RtspError::InvalidMediaGroup(
                "media description group must have at least one member".into(),
            ));
        };

        let port = first.rtp_port();
        let mut seen_payload_types = std::collections::HashSet::new();
        for m in &members {
            if m.rtp_port() != port {
                return Err(RtspError::InvalidMediaGroup(format!(
                    "member {:?} has port {}, expected {port}",
                    m.name(),
                    m.rtp_port()
                )));
            }
            if !seen_payload_types.insert(m.rtp_payload_type()) {
                return Err(RtspError::InvalidMediaGroup(format!(
                    "duplicate payload type {} in group",
                    m.rtp_payload_type()
                )));
            }
        }

        Ok(Self(members))
    }

    /// The canonical member used for session-level media attributes
    /// (control URL, framerate, license/metadata/title/author).
    pub fn first(&self) -> &MediaDescription {
        &self.0[0]
    }

    pub fn members(&self) -> &[MediaDescription] {
        &self.0
    }
}

/// A streamable resource: session-level metadata plus its media.
#[derive(Debug, Clone)]
pub struct ResourceDescription {
    name: Option<String>,
    description_uri: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    mrl: Option<String>,
    last_change: u64,
    duration_seconds: f64,
    multicast_address: Option<String>,
    ttl: Option<String>,
    private_fields: Vec<SdpField>,
    media: Vec<MediaDescriptionGroup>,
}

impl ResourceDescription {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        description_uri: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        mrl: impl Into<String>,
        last_change: u64,
        duration_seconds: f64,
        multicast_address: impl Into<String>,
        ttl: impl Into<String>,
    ) -> Self {
        Self {
            name: normalize(name),
            description_uri: normalize(description_uri),
            email: normalize(email),
            phone: normalize(phone),
            mrl: normalize(mrl),
            last_change,
            duration_seconds,
            multicast_address: normalize(multicast_address),
            ttl: normalize(ttl),
            private_fields: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn with_private_fields(mut self, fields: Vec<SdpField>) -> Self {
        self.private_fields = fields;
        self
    }

    pub fn with_media(mut self, media: Vec<MediaDescriptionGroup>) -> Self {
        self.media = media;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description_uri(&self) -> Option<&str> {
        self.description_uri.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Media resource locator — the original source this description was
    /// read from. Also serves as the "twin"/alias field of the
    /// originating store, which never grew beyond a placeholder there.
    pub fn mrl(&self) -> Option<&str> {
        self.mrl.as_deref()
    }

    /// Last modification time, Unix epoch seconds. `0` means unknown.
    pub fn last_change(&self) -> u64 {
        self.last_change
    }

    /// Total duration in seconds; `0.0` means live/unbounded.
    pub fn duration(&self) -> f64 {
        self.duration_seconds
    }

    pub fn multicast(&self) -> Option<&str> {
        self.multicast_address.as_deref()
    }

    pub fn ttl(&self) -> Option<&str> {
        self.ttl.as_deref()
    }

    pub fn private_fields(&self) -> &[SdpField] {
        &self.private_fields
    }

    pub fn media_groups(&self) -> &[MediaDescriptionGroup] {
        &self.media
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_md() -> MediaDescription {
        MediaDescription::new(MediaKind::Video, "video0", 96, 5004, 90000, 25.0, "", "", "", "")
            .with_private_fields(vec![SdpField::fmtp("profile-level-id=42e01e")])
    }

    #[test]
    fn empty_strings_normalize_to_none() {
        let r = ResourceDescription::new("Stream", "", "", "", "", 0, 0.0, "", "");
        assert_eq!(r.name(), Some("Stream"));
        assert_eq!(r.description_uri(), None);
        assert_eq!(r.email(), None);
        assert_eq!(r.mrl(), None);
    }

    #[test]
    fn media_group_rejects_empty() {
        assert!(MediaDescriptionGroup::new(Vec::new()).is_err());
    }

    #[test]
    fn media_group_rejects_port_mismatch() {
        let a = video_md();
        let b = MediaDescription::new(MediaKind::Video, "video1", 97, 5006, 90000, 25.0, "", "", "", "");
        assert!(MediaDescriptionGroup::new(vec![a, b]).is_err());
    }

    #[test]
    fn media_group_rejects_duplicate_payload_type() {
        let a = video_md();
        let b = MediaDescription::new(MediaKind::Video, "video1", 96, 5004, 90000, 25.0, "", "", "", "");
        assert!(MediaDescriptionGroup::new(vec![a, b]).is_err());
    }

    #[test]
    fn media_group_accepts_valid_members() {
        let group = MediaDescriptionGroup::new(vec![video_md()]).unwrap();
        assert_eq!(group.first().name(), "video0");
        assert_eq!(group.members().len(), 1);
    }
}
