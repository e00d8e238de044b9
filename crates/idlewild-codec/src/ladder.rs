//! Declarative version-gated field ladders.
//!
//! Each persisted section describes its decode as an ordered table of
//! `(version range, reader)` steps instead of inline version conditionals.
//! A step runs only when the stream's version falls inside its range:
//!
//! - a field added at version `X` uses [`VersionRange::since`]`(X)`; older
//!   streams skip the step and the field keeps its default;
//! - a field removed at version `Y` uses [`VersionRange::between`]`(X, Y)`
//!   with a reader that consumes and discards the bytes, so streams in
//!   `X..Y` stay aligned.
//!
//! Steps must be listed in the order the fields were written.

use core::fmt;

use tracing::trace;

use crate::error::CodecError;
use crate::object::SaveDecoder;

/// Half-open range of schema versions in which a field is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    since: u32,
    until: Option<u32>,
}

impl VersionRange {
    /// Present from `since` onwards.
    pub const fn since(since: u32) -> Self {
        Self { since, until: None }
    }

    /// Present from `since` up to, but excluding, `until`.
    pub const fn between(since: u32, until: u32) -> Self {
        Self {
            since,
            until: Some(until),
        }
    }

    /// Whether a stream written at `version` contains the field.
    pub const fn contains(&self, version: u32) -> bool {
        if version < self.since {
            return false;
        }
        match self.until {
            Some(until) => version < until,
            None => true,
        }
    }
}

/// Reads one field of section `S` with decode context `C`.
pub type FieldReader<S, C> = fn(&mut SaveDecoder<'_>, &C, &mut S) -> Result<(), CodecError>;

/// One rung of a ladder.
pub struct FieldStep<S: 'static, C: 'static> {
    /// Field name, used in trace output.
    pub name: &'static str,
    /// Versions whose streams contain the field.
    pub range: VersionRange,
    /// Reader applied when the field is present.
    pub read: FieldReader<S, C>,
}

impl<S, C> FieldStep<S, C> {
    /// A field present from `since` onwards.
    pub const fn added(since: u32, name: &'static str, read: FieldReader<S, C>) -> Self {
        Self {
            name,
            range: VersionRange::since(since),
            read,
        }
    }

    /// A field present in `since..until` that later versions no longer
    /// write. `read` must consume exactly the bytes that were written.
    pub const fn removed(
        since: u32,
        until: u32,
        name: &'static str,
        read: FieldReader<S, C>,
    ) -> Self {
        Self {
            name,
            range: VersionRange::between(since, until),
            read,
        }
    }
}

impl<S, C> fmt::Debug for FieldStep<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStep")
            .field("name", &self.name)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// Ordered decode table for one persisted section.
pub struct FieldLadder<S: 'static, C: 'static> {
    section: &'static str,
    steps: &'static [FieldStep<S, C>],
}

impl<S, C> FieldLadder<S, C> {
    /// Create a ladder for `section` from its steps, in write order.
    pub const fn new(section: &'static str, steps: &'static [FieldStep<S, C>]) -> Self {
        Self { section, steps }
    }

    /// Section name.
    pub const fn section(&self) -> &'static str {
        self.section
    }

    /// The steps in write order.
    pub const fn steps(&self) -> &'static [FieldStep<S, C>] {
        self.steps
    }

    /// Apply every step whose range contains the decoder's version.
    pub fn apply(
        &self,
        decoder: &mut SaveDecoder<'_>,
        context: &C,
        state: &mut S,
    ) -> Result<(), CodecError> {
        let version = decoder.version();
        for step in self.steps {
            if step.range.contains(version) {
                (step.read)(decoder, context, state)?;
            } else {
                trace!(
                    section = self.section,
                    field = step.name,
                    version,
                    "field not present at this version"
                );
            }
        }
        Ok(())
    }
}

impl<S, C> fmt::Debug for FieldLadder<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldLadder")
            .field("section", &self.section)
            .field("steps", &self.steps)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::ReferenceManifest;
    use crate::reader::SaveReader;
    use crate::writer::SaveWriter;

    #[derive(Debug, Default)]
    struct Section {
        base: u32,
        added_at_113: u32,
        tail: u8,
    }

    fn read_base(d: &mut SaveDecoder<'_>, _ctx: &(), s: &mut Section) -> Result<(), CodecError> {
        s.base = d.read_u32()?;
        Ok(())
    }

    fn discard_tab(d: &mut SaveDecoder<'_>, _ctx: &(), _s: &mut Section) -> Result<(), CodecError> {
        d.read_u8().map(|_discarded| ())
    }

    fn read_added(d: &mut SaveDecoder<'_>, _ctx: &(), s: &mut Section) -> Result<(), CodecError> {
        s.added_at_113 = d.read_u32()?;
        Ok(())
    }

    fn read_tail(d: &mut SaveDecoder<'_>, _ctx: &(), s: &mut Section) -> Result<(), CodecError> {
        s.tail = d.read_u8()?;
        Ok(())
    }

    const STEPS: &[FieldStep<Section, ()>] = &[
        FieldStep::added(100, "base", read_base),
        FieldStep::removed(100, 112, "tab", discard_tab),
        FieldStep::added(113, "added_at_113", read_added),
        FieldStep::added(100, "tail", read_tail),
    ];

    const LADDER: FieldLadder<Section, ()> = FieldLadder::new("test", STEPS);

    fn decode(bytes: &[u8], version: u32) -> Section {
        let manifest = ReferenceManifest::new();
        let mut decoder = SaveDecoder::new(SaveReader::new(bytes), &manifest, version);
        let mut section = Section::default();
        LADDER.apply(&mut decoder, &(), &mut section).unwrap();
        assert!(decoder.is_exhausted());
        section
    }

    #[test]
    fn range_bounds() {
        let range = VersionRange::between(100, 112);
        assert!(!range.contains(99));
        assert!(range.contains(100));
        assert!(range.contains(111));
        assert!(!range.contains(112));
        assert!(VersionRange::since(113).contains(500));
    }

    #[test]
    fn version_110_discards_removed_and_defaults_added() {
        let mut writer = SaveWriter::new();
        writer.write_u32(5);
        writer.write_u8(3); // removed tab byte, still present at 110
        writer.write_u8(9);
        let section = decode(&writer.into_bytes().unwrap(), 110);
        assert_eq!(section.base, 5);
        assert_eq!(section.added_at_113, 0);
        assert_eq!(section.tail, 9);
    }

    #[test]
    fn version_113_reads_added_field() {
        let mut writer = SaveWriter::new();
        writer.write_u32(5);
        writer.write_u32(42);
        writer.write_u8(9);
        let section = decode(&writer.into_bytes().unwrap(), 113);
        assert_eq!(section.added_at_113, 42);
        assert_eq!(section.tail, 9);
    }
}
