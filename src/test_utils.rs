//! Builders for small synthetic containers shared by the unit tests

use crate::types::LOOP_DIMENSIONS;
use crate::utils::encoding::encode_header_text;

/// Opaque bytes written after the parameter text of a non-indexed header.
pub(crate) const VB_TRAILER: [u8; 24] = [0xA5; 24];

/// A parameter block carrying every field the decoder reads and every kind of
/// identifying value the anonymizer rewrites.
pub(crate) fn sample_header() -> String {
    [
        "<XProtocol>",
        "{",
        "  <Name> \"PhoenixMetaProtocol\"",
        "  <ParamString.\"tProtocolName\">  { \"svs_se_30\"  }",
        "  <ParamLong.\"Frequency\">  { 123456000  }",
        "  <ParamLong.\"DwellTimeSig\">  { 5000  }",
        "  <ParamString.\"PatientID\">  { \"AB12\"  }",
        "  <ParamString.\"PatientName\">  { \"Doe^Jane\"  }",
        "  <ParamString.\"PatientBirthDay\">  { \"19650412\"  }",
        "  <ParamLong.\"PatientSex\">  { 2  }",
        "  <ParamString.\"FrameOfReference\">  { \"1.3.12.2.1107.5.2.32.35056.1.20140314130748312.0.0.0\"  }",
        "  <ParamString.\"InstitutionName\">  { \"General Hospital\"  }",
        "  <ParamMap.\"Dicom\">  {",
        "    <ParamString.\"OtherPatientID\">  { \"AB12\"  }",
        "    <ParamString.\"PatientsName\">  { \"Doe^Jane\"  }",
        "    <ParamString.\"PatientsBirthDate\">  { \"19650412\"  }",
        "    <ParamLong.\"lPatientSex\">  { 2  }",
        "    <ParamLong.\"AgeAndSex\">  { 47  }",
        "    <ParamString.\"SeriesUID\">  { \"1.3.12.2.1107.5.2.32.35056.2014031413120345678901234.0.0.0\"  }",
        "  }",
        "}",
        "### ASCCONV BEGIN ###",
        "sStudy.tDate = \"20140314\"",
        "sProtConsistencyInfo.tBaselineString = \"N4_VB17A_LATEST_20140314\"",
        "sRXSPEC.lGain = 1",
        "tStation = \"1.3.12.2.1107.5.2.32.35056\"",
        "tComment = AB12 unquoted",
        "### ASCCONV END ###",
        "",
    ]
    .join("\n")
}

#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn zeros(&mut self, count: usize) -> &mut Self {
        self.bytes.resize(self.bytes.len() + count, 0);
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn fixed_string(&mut self, text: &str, width: usize) -> &mut Self {
        let start = self.bytes.len();
        self.bytes(text.as_bytes());
        self.bytes.resize(start + width, 0);
        self
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

/// One record to be written. Samples are given as stored on disk (conjugated).
#[derive(Debug, Clone, Default)]
pub(crate) struct TestRecord {
    pub flags: u64,
    pub loop_index: [u16; LOOP_DIMENSIONS],
    pub dummy_points: u16,
    pub fid_start: u16,
    pub channels: Vec<Vec<(f32, f32)>>,
    pub padding: usize,
    /// Written instead of the true record length.
    pub declared_length: Option<u32>,
}

impl TestRecord {
    pub fn scan(channels: Vec<Vec<(f32, f32)>>) -> Self {
        Self {
            channels,
            ..Default::default()
        }
    }

    /// `channels` channels of `samples` samples; sample `s` of channel `c` is stored as `(10c + s, s)`.
    pub fn ramp(channels: usize, samples: usize) -> Self {
        Self::scan(
            (0..channels)
                .map(|c| {
                    (0..samples)
                        .map(|s| ((10 * c + s) as f32, s as f32))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn auxiliary(bit: u32) -> Self {
        Self {
            flags: 1 << bit,
            padding: 16,
            ..Default::default()
        }
    }

    pub fn acquisition_end() -> Self {
        Self {
            flags: 1,
            ..Default::default()
        }
    }

    pub fn at(mut self, dimension: usize, value: u16) -> Self {
        self.loop_index[dimension] = value;
        self
    }

    pub fn with_dummy_points(mut self, count: u16) -> Self {
        self.dummy_points = count;
        self
    }

    pub fn with_fid_start(mut self, start: u16) -> Self {
        self.fid_start = start;
        self
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_declared_length(mut self, length: u32) -> Self {
        self.declared_length = Some(length);
        self
    }

    fn sample_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    fn length(&self, header: usize, channel_header: usize) -> usize {
        let per_channel = channel_header + 8 * self.sample_count();
        header + per_channel * self.channels.len() + self.padding
    }
}

fn write_samples(w: &mut ByteWriter, channel: &[(f32, f32)]) {
    for &(re, im) in channel {
        w.f32(re).f32(im);
    }
}

/// The 124 bytes every non-indexed channel block starts with.
fn vb_common_header(record: &TestRecord, length: u32) -> Vec<u8> {
    let mut w = ByteWriter::default();
    w.u32(length).u32(7).u32(1).u32(0).u32(0).u64(record.flags);
    w.u16(record.sample_count() as u16)
        .u16(record.channels.len() as u16);
    for &index in &record.loop_index {
        w.u16(index);
    }
    w.zeros(20).zeros(8);
    w.u16(record.dummy_points).zeros(6);
    w.zeros(28);
    w.into_inner()
}

pub(crate) fn vb_record(record: &TestRecord) -> Vec<u8> {
    let length = record.length(0, 128).max(128 + record.padding);
    let header = vb_common_header(record, record.declared_length.unwrap_or(length as u32));

    let mut w = ByteWriter::default();
    w.bytes(&header);
    if record.channels.is_empty() {
        w.zeros(4);
    }
    for (i, channel) in record.channels.iter().enumerate() {
        if i > 0 {
            w.bytes(&header);
        }
        w.u16(i as u16).i16(0);
        write_samples(&mut w, channel);
    }
    w.zeros(record.padding);
    w.into_inner()
}

/// A non-indexed container: header block at byte 0, then the records.
pub(crate) fn vb_container(text: &str, records: &[TestRecord]) -> Vec<u8> {
    let text = encode_header_text(text).expect("test header is windows-1252");
    let mut w = ByteWriter::default();
    w.u32((4 + text.len() + VB_TRAILER.len()) as u32)
        .bytes(&text)
        .bytes(&VB_TRAILER);
    for record in records {
        w.bytes(&vb_record(record));
    }
    w.into_inner()
}

pub(crate) fn vd_record(record: &TestRecord) -> Vec<u8> {
    let length = record.length(192, 32);

    let mut w = ByteWriter::default();
    w.u32(record.declared_length.unwrap_or(length as u32))
        .u32(7)
        .u32(1)
        .u32(0)
        .u32(0);
    w.u16(0).u16(0).zeros(16).u64(record.flags);
    w.u16(record.sample_count() as u16)
        .u16(record.channels.len() as u16);
    for &index in &record.loop_index {
        w.u16(index);
    }
    w.zeros(20).zeros(28);
    for slot in 0..24 {
        w.u16(if slot == 4 { record.fid_start } else { 0 });
    }
    w.u16(record.dummy_points).zeros(6);
    w.u16(0).u16(0).u32(0);

    for (i, channel) in record.channels.iter().enumerate() {
        w.u32(0).u32(7).u32(1).zeros(4).u32(0).zeros(4);
        w.u16(i as u16).zeros(6);
        write_samples(&mut w, channel);
    }
    w.zeros(record.padding);
    w.into_inner()
}

/// An indexed container holding one measurement per `(header text, records)` pair.
pub(crate) fn vd_container(measurements: &[(&str, &[TestRecord])]) -> Vec<u8> {
    let bodies: Vec<Vec<u8>> = measurements
        .iter()
        .map(|(text, records)| {
            let text = encode_header_text(text).expect("test header is windows-1252");
            let mut w = ByteWriter::default();
            w.u32((4 + text.len()) as u32).bytes(&text);
            for record in records.iter() {
                w.bytes(&vd_record(record));
            }
            w.into_inner()
        })
        .collect();

    let mut w = ByteWriter::default();
    w.u32(0).u32(measurements.len() as u32);
    let mut offset = 8 + 152 * measurements.len();
    for (i, body) in bodies.iter().enumerate() {
        w.u32(i as u32 + 1)
            .u32(100 + i as u32)
            .u64(offset as u64)
            .u64(body.len() as u64)
            .fixed_string("Doe^Jane", 64)
            .fixed_string(&format!("meas{i}"), 64);
        offset += body.len();
    }
    for body in &bodies {
        w.bytes(body);
    }
    w.into_inner()
}
