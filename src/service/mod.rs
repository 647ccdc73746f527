//! The BACnet object model and the two confirmed services this client speaks:
//! `ReadPropertyMultiple` (service choice 14) and `WriteProperty` (service choice 15).
//!
//! This module turns [`PropertyDescriptor`]s into APDU bytes and turns APDU bytes back
//! into a [`DeviceState`]. It knows nothing about UDP, segmentation, or timeouts — that
//! lives in [`crate::transport`].

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, string::String, vec, vec::Vec};

#[cfg(feature = "std")]
use std::collections::BTreeMap;

use crate::app::{confirmed_request_header, ApduHeaderByte, ApduType};
use crate::encoding::{
    ctx_tag, decode_primitive, encode_primitive, DecodeError, DecodeResult, EncodeError, EncodeResult,
    DecodingCursor, Lvt, Primitive,
};

/// `service_choice` for ReadPropertyMultiple.
pub const SERVICE_READ_PROPERTY_MULTIPLE: u8 = 14;
/// `service_choice` for WriteProperty.
pub const SERVICE_WRITE_PROPERTY: u8 = 15;

/// Context tag numbers used inside the RPM/WriteProperty APDU bodies.
mod ctx {
    pub const OBJECT_IDENTIFIER: u8 = 0;
    pub const LIST_OF_PROPERTIES: u8 = 1;
    pub const PROPERTY_IDENTIFIER: u8 = 2;
    pub const PROPERTY_VALUE: u8 = 4;
    pub const PROPERTY_ACCESS_ERROR: u8 = 5;
    pub const PRIORITY: u8 = 4; // WriteProperty's priority tag reuses number 4 in its own context
}

/// Object types this client recognises. Mirrors the subset the RDS110.R actually exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectType {
    AnalogInput,
    AnalogOutput,
    AnalogValue,
    BinaryInput,
    BinaryValue,
    Device,
    MultiStateValue,
    PositiveIntegerValue,
}

impl ObjectType {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::AnalogInput => 0,
            Self::AnalogOutput => 1,
            Self::AnalogValue => 2,
            Self::BinaryInput => 3,
            Self::BinaryValue => 5,
            Self::Device => 8,
            Self::MultiStateValue => 19,
            Self::PositiveIntegerValue => 48,
        }
    }

    pub fn from_u32(value: u32) -> DecodeResult<Self> {
        match value {
            0 => Ok(Self::AnalogInput),
            1 => Ok(Self::AnalogOutput),
            2 => Ok(Self::AnalogValue),
            3 => Ok(Self::BinaryInput),
            5 => Ok(Self::BinaryValue),
            8 => Ok(Self::Device),
            19 => Ok(Self::MultiStateValue),
            48 => Ok(Self::PositiveIntegerValue),
            other => Err(DecodeError::UnknownObjectType(other)),
        }
    }
}

/// BACnet property identifiers this client recognises by name; anything else is
/// preserved as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyIdentifier {
    Description,
    ObjectName,
    PresentValue,
    PriorityArray,
    Other(u32),
}

impl PropertyIdentifier {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Description => 28,
            Self::ObjectName => 77,
            Self::PresentValue => 85,
            Self::PriorityArray => 87,
            Self::Other(v) => v,
        }
    }

    pub fn from_u32(value: u32) -> Self {
        match value {
            28 => Self::Description,
            77 => Self::ObjectName,
            85 => Self::PresentValue,
            87 => Self::PriorityArray,
            other => Self::Other(other),
        }
    }
}

/// `(ObjectType, instance_id)`. Wire form is `(object_type << 22) | (instance_id & 0x3FFFFF)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectIdentifier {
    pub object_type: ObjectType,
    pub instance_id: u32,
}

impl ObjectIdentifier {
    pub fn new(object_type: ObjectType, instance_id: u32) -> Self {
        debug_assert!(instance_id <= 0x3F_FFFF, "instance id must fit in 22 bits");
        Self { object_type, instance_id }
    }

    pub fn to_u32(self) -> u32 {
        (self.object_type.as_u32() << 22) | (self.instance_id & 0x3F_FFFF)
    }

    pub fn from_u32(raw: u32) -> DecodeResult<Self> {
        let object_type = ObjectType::from_u32(raw >> 22)?;
        Ok(Self { object_type, instance_id: raw & 0x3F_FFFF })
    }
}

/// A value carried by one BACnet property.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    Null,
    Bool(bool),
    UnsignedInt(u32),
    SignedInt(i64),
    Real(f32),
    Double(f64),
    CharString(String),
    Enumerated(u32),
    ObjectId(ObjectIdentifier),
    /// Always exactly 16 elements, one per BACnet priority level.
    PriorityArray(Vec<PropertyValue>),
    AccessError { error_class: u32, error_code: u32 },
    Unknown { tag: u8, raw: Vec<u8> },
}

impl From<Primitive> for PropertyValue {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::Null => PropertyValue::Null,
            Primitive::Boolean(b) => PropertyValue::Bool(b),
            Primitive::UnsignedInt(v) => PropertyValue::UnsignedInt(v),
            Primitive::SignedInt(v) => PropertyValue::SignedInt(v),
            Primitive::Real(v) => PropertyValue::Real(v),
            Primitive::Double(v) => PropertyValue::Double(v),
            Primitive::CharString(s) => PropertyValue::CharString(s),
            Primitive::Enumerated(v) => PropertyValue::Enumerated(v),
            Primitive::ObjectIdentifier(v) => match ObjectIdentifier::from_u32(v) {
                Ok(oid) => PropertyValue::ObjectId(oid),
                Err(_) => PropertyValue::Unknown { tag: 12, raw: v.to_be_bytes().to_vec() },
            },
            Primitive::Unknown { tag, raw } => PropertyValue::Unknown { tag, raw },
        }
    }
}

/// A caller-supplied hint for the application primitive a WriteProperty should use.
/// Only consulted when the object type doesn't already dictate one (see
/// [`primitive_for_write`]) — `AnalogValue` always writes `Real` and `BinaryValue` always
/// writes `Enumerated` regardless of this hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteType {
    UnsignedInt,
    Real,
    Enumerated,
}

/// Describes one object and the properties to read from (or the value to write to) it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyDescriptor {
    pub object_type: ObjectType,
    pub instance_id: u32,
    pub read_properties: Vec<PropertyIdentifier>,
    pub priority: Option<u8>,
    pub write_type: Option<WriteType>,
}

impl PropertyDescriptor {
    pub fn new(object_type: ObjectType, instance_id: u32) -> Self {
        Self {
            object_type,
            instance_id,
            read_properties: vec![PropertyIdentifier::PresentValue],
            priority: None,
            write_type: None,
        }
    }

    pub fn with_read_properties(mut self, properties: Vec<PropertyIdentifier>) -> Self {
        self.read_properties = properties;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        debug_assert!((1..=16).contains(&priority));
        self.priority = Some(priority);
        self
    }

    pub fn with_write_type(mut self, write_type: WriteType) -> Self {
        self.write_type = Some(write_type);
        self
    }

    pub fn object_identifier(&self) -> ObjectIdentifier {
        ObjectIdentifier::new(self.object_type, self.instance_id)
    }
}

/// Snapshot of everything read back from a device: object identifier to its properties,
/// in request order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceState {
    objects: BTreeMap<ObjectIdentifier, Vec<(PropertyIdentifier, PropertyValue)>>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self { objects: BTreeMap::new() }
    }

    pub fn insert(&mut self, object: ObjectIdentifier, properties: Vec<(PropertyIdentifier, PropertyValue)>) {
        self.objects.entry(object).or_default().extend(properties);
    }

    pub fn get(&self, object: ObjectIdentifier, property: PropertyIdentifier) -> Option<&PropertyValue> {
        self.objects
            .get(&object)?
            .iter()
            .find(|(id, _)| *id == property)
            .map(|(_, value)| value)
    }

    pub fn properties(&self, object: ObjectIdentifier) -> Option<&[(PropertyIdentifier, PropertyValue)]> {
        self.objects.get(&object).map(Vec::as_slice)
    }

    pub fn merge(&mut self, other: DeviceState) {
        for (object, properties) in other.objects {
            self.objects.entry(object).or_default().extend(properties);
        }
    }
}

/// Build a ReadPropertyMultiple confirmed-request APDU for one or more descriptors.
///
/// The caller is responsible for chunking large descriptor lists (the device facade does
/// this at 20 descriptors per request); this function never fragments.
pub fn encode_read_property_multiple(descriptors: &[PropertyDescriptor]) -> EncodeResult<Vec<u8>> {
    let mut apdu = confirmed_request_header(SERVICE_READ_PROPERTY_MULTIPLE).to_vec();
    for descriptor in descriptors {
        let object_id = descriptor.object_identifier().to_u32();
        ctx_tag(&mut apdu, ctx::OBJECT_IDENTIFIER, Lvt::Length(4))?;
        apdu.extend_from_slice(&object_id.to_be_bytes());
        ctx_tag(&mut apdu, ctx::LIST_OF_PROPERTIES, Lvt::Open)?;
        for property in &descriptor.read_properties {
            let value = property.as_u32();
            let bytes = minimal_be_bytes(value);
            ctx_tag(&mut apdu, ctx::PROPERTY_IDENTIFIER, Lvt::Length(bytes.len() as u32))?;
            apdu.extend_from_slice(&bytes);
        }
        ctx_tag(&mut apdu, ctx::LIST_OF_PROPERTIES, Lvt::Close)?;
    }
    Ok(apdu)
}

fn minimal_be_bytes(v: u32) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(3);
    bytes[first_nonzero..].to_vec()
}

/// Decode a ReadPropertyMultiple-Ack APDU (the 3-byte header plus the nested
/// object/property/value grammar) into a [`DeviceState`].
pub fn decode_read_property_multiple_ack(apdu: &[u8]) -> DecodeResult<DeviceState> {
    if apdu.len() < 3 {
        return Err(DecodeError::UnexpectedEof);
    }
    let header = ApduHeaderByte::parse(apdu[0])?;
    if header.pdu_type != ApduType::ComplexAck {
        return Err(DecodeError::UnexpectedApduType { expected: ApduType::ComplexAck as u8, got: apdu[0] >> 4 });
    }
    let mut cursor = DecodingCursor::new(&apdu[3..]);
    let mut state = DeviceState::new();

    while !cursor.is_empty() {
        let (number, lvt) = cursor.read_context_tag()?;
        if number != ctx::OBJECT_IDENTIFIER {
            return Err(DecodeError::ExpectedContextTag { expected: ctx::OBJECT_IDENTIFIER, got_class: 1, got_number: number });
        }
        if lvt != 4 {
            return Err(DecodeError::UnsupportedPrimitiveLength { tag: ctx::OBJECT_IDENTIFIER, length: lvt });
        }
        let raw = cursor.read_exact(4)?;
        let object = ObjectIdentifier::from_u32(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))?;

        cursor.expect_open(ctx::LIST_OF_PROPERTIES)?;
        let mut properties = Vec::new();
        while !cursor.at_close(ctx::LIST_OF_PROPERTIES)? {
            let (pid_number, pid_lvt) = cursor.read_context_tag()?;
            if pid_number != ctx::PROPERTY_IDENTIFIER {
                return Err(DecodeError::ExpectedContextTag { expected: ctx::PROPERTY_IDENTIFIER, got_class: 1, got_number: pid_number });
            }
            let pid_bytes = cursor.read_exact(pid_lvt as usize)?;
            let property = PropertyIdentifier::from_u32(be_to_u32(pid_bytes));

            let (wrapper_number, wrapper_class, wrapper_lvt) = cursor.read_tag()?;
            if wrapper_class != 1 || wrapper_lvt != crate::encoding::TAG_OPEN as u32 {
                return Err(DecodeError::ExpectedOpen { tag_number: wrapper_number });
            }
            let value = match wrapper_number {
                ctx::PROPERTY_VALUE => decode_property_value(&mut cursor, property)?,
                ctx::PROPERTY_ACCESS_ERROR => {
                    let error_class = decode_enumerated_primitive(&mut cursor)?;
                    let error_code = decode_enumerated_primitive(&mut cursor)?;
                    PropertyValue::AccessError { error_class, error_code }
                }
                other => return Err(DecodeError::ExpectedOpen { tag_number: other }),
            };
            cursor.expect_close(wrapper_number)?;
            properties.push((property, value));
        }
        cursor.expect_close(ctx::LIST_OF_PROPERTIES)?;
        state.insert(object, properties);
    }
    Ok(state)
}

fn be_to_u32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

fn decode_enumerated_primitive(cursor: &mut DecodingCursor<'_>) -> DecodeResult<u32> {
    let (number, lvt) = cursor.read_application_tag()?;
    match decode_primitive(cursor, number, lvt)? {
        Primitive::Enumerated(v) => Ok(v),
        Primitive::UnsignedInt(v) => Ok(v),
        _ => Err(DecodeError::UnsupportedPrimitiveLength { tag: number, length: lvt }),
    }
}

/// Decode the contents of an open property-value wrapper (ctx-tag 4), handling the
/// PriorityArray special case where 16 application-tagged primitives follow with no
/// explicit count.
fn decode_property_value(cursor: &mut DecodingCursor<'_>, property: PropertyIdentifier) -> DecodeResult<PropertyValue> {
    if property == PropertyIdentifier::PriorityArray {
        let mut slots = Vec::with_capacity(16);
        while !cursor.at_close(ctx::PROPERTY_VALUE)? {
            let (number, lvt) = cursor.read_application_tag()?;
            slots.push(decode_primitive(cursor, number, lvt)?.into());
        }
        return Ok(PropertyValue::PriorityArray(slots));
    }
    let (number, lvt) = cursor.read_application_tag()?;
    Ok(decode_primitive(cursor, number, lvt)?.into())
}

/// Build a WriteProperty confirmed-request APDU for a single (object, PRESENT_VALUE) pair.
///
/// The application primitive tag is chosen by object type: `AnalogValue` writes a `Real`,
/// `BinaryValue` writes an `Enumerated`, everything else an `UnsignedInt`. Writing
/// [`PropertyValue::Null`] relinquishes the priority slot.
pub fn encode_write_property(descriptor: &PropertyDescriptor, value: &PropertyValue) -> EncodeResult<Vec<u8>> {
    let mut apdu = confirmed_request_header(SERVICE_WRITE_PROPERTY).to_vec();
    let object_id = descriptor.object_identifier().to_u32();
    ctx_tag(&mut apdu, ctx::OBJECT_IDENTIFIER, Lvt::Length(4))?;
    apdu.extend_from_slice(&object_id.to_be_bytes());

    let present_value = PropertyIdentifier::PresentValue.as_u32();
    ctx_tag(&mut apdu, 1, Lvt::Length(1))?;
    apdu.push(present_value as u8);

    ctx_tag(&mut apdu, 3, Lvt::Open)?;
    let primitive = primitive_for_write(descriptor.object_type, descriptor.write_type, value)?;
    encode_primitive(&mut apdu, &primitive)?;
    ctx_tag(&mut apdu, 3, Lvt::Close)?;

    if let Some(priority) = descriptor.priority {
        ctx_tag(&mut apdu, ctx::PRIORITY, Lvt::Length(1))?;
        apdu.push(priority);
    }
    Ok(apdu)
}

/// Object-type rules take priority over `write_type`: `AnalogValue` always writes `Real`,
/// `BinaryValue` always writes `Enumerated`. The hint is only consulted for every other
/// object type, where the natural primitive isn't implied by the type alone.
fn primitive_for_write(
    object_type: ObjectType,
    write_type: Option<WriteType>,
    value: &PropertyValue,
) -> EncodeResult<Primitive> {
    if matches!(value, PropertyValue::Null) {
        return Ok(Primitive::Null);
    }
    let incompatible = |tag| EncodeError::IncompatibleValue { object_type: object_type.as_u32(), tag };
    match object_type {
        ObjectType::AnalogValue => match value {
            PropertyValue::Real(v) => Ok(Primitive::Real(*v)),
            PropertyValue::UnsignedInt(v) => Ok(Primitive::Real(*v as f32)),
            _ => Err(incompatible(4)),
        },
        ObjectType::BinaryValue => match value {
            PropertyValue::Enumerated(v) => Ok(Primitive::Enumerated(*v)),
            PropertyValue::Bool(b) => Ok(Primitive::Enumerated(if *b { 1 } else { 0 })),
            PropertyValue::UnsignedInt(v) => Ok(Primitive::Enumerated(*v)),
            _ => Err(incompatible(9)),
        },
        _ => match write_type {
            Some(WriteType::Real) => match value {
                PropertyValue::Real(v) => Ok(Primitive::Real(*v)),
                PropertyValue::UnsignedInt(v) => Ok(Primitive::Real(*v as f32)),
                _ => Err(incompatible(4)),
            },
            Some(WriteType::Enumerated) => match value {
                PropertyValue::Enumerated(v) => Ok(Primitive::Enumerated(*v)),
                PropertyValue::UnsignedInt(v) => Ok(Primitive::Enumerated(*v)),
                _ => Err(incompatible(9)),
            },
            Some(WriteType::UnsignedInt) | None => match value {
                PropertyValue::UnsignedInt(v) => Ok(Primitive::UnsignedInt(*v)),
                PropertyValue::Enumerated(v) => Ok(Primitive::UnsignedInt(*v)),
                _ => Err(incompatible(2)),
            },
        },
    }
}

/// Validate a SimpleAck APDU (the WriteProperty acknowledgement): no body, just a
/// matching invoke_id and service_choice.
pub fn decode_simple_ack(apdu: &[u8], expected_invoke_id: u8, expected_service_choice: u8) -> DecodeResult<()> {
    if apdu.len() < 3 {
        return Err(DecodeError::UnexpectedEof);
    }
    let header = ApduHeaderByte::parse(apdu[0])?;
    if header.pdu_type != ApduType::SimpleAck {
        return Err(DecodeError::UnexpectedApduType { expected: ApduType::SimpleAck as u8, got: apdu[0] >> 4 });
    }
    if apdu[1] != expected_invoke_id {
        return Err(DecodeError::UnexpectedInvokeId { expected: expected_invoke_id, got: apdu[1] });
    }
    if apdu[2] != expected_service_choice {
        return Err(DecodeError::UnexpectedServiceChoice { expected: expected_service_choice, got: apdu[2] });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_identifier_wire_form() {
        let oid = ObjectIdentifier::new(ObjectType::AnalogValue, 111);
        assert_eq!(oid.to_u32(), 0x0080006F);
    }

    // S1: RPM request for one descriptor (ANALOG_VALUE, 134, [PRESENT_VALUE]).
    #[test]
    fn encode_read_property_multiple_single_descriptor() {
        let descriptor = PropertyDescriptor::new(ObjectType::AnalogValue, 134);
        let apdu = encode_read_property_multiple(&[descriptor]).unwrap();
        assert_eq!(
            apdu,
            vec![0x02, 0x44, 0x01, 0x0E, 0x0C, 0x00, 0x80, 0x00, 0x86, 0x1E, 0x09, 0x55, 0x1F]
        );
    }

    // Structural length law: each descriptor contributes a fixed 7-byte frame (ctx-tag 0
    // len 4 = 5 bytes, list-of-properties open+close = 2 bytes) plus 2 bytes per requested
    // property (ctx-tag 2 len 1 + the property id byte), on top of the 4-byte header.
    #[test]
    fn encode_read_property_multiple_matches_structural_length_law() {
        let descriptors = vec![
            PropertyDescriptor::new(ObjectType::AnalogValue, 134),
            PropertyDescriptor::new(ObjectType::AnalogValue, 127)
                .with_read_properties(vec![PropertyIdentifier::PresentValue, PropertyIdentifier::PriorityArray]),
        ];
        let apdu = encode_read_property_multiple(&descriptors).unwrap();
        let property_count: usize = descriptors.iter().map(|d| d.read_properties.len()).sum();
        let expected_len = 4 + descriptors.len() * 7 + property_count * 2;
        assert_eq!(apdu.len(), expected_len);
    }

    // S2: decode a reply carrying (ANALOG_VALUE, 134) -> PRESENT_VALUE = Real(21.5).
    #[test]
    fn decode_read_property_multiple_ack_single_real_value() {
        let object = ObjectIdentifier::new(ObjectType::AnalogValue, 134);
        let mut body = Vec::new();
        ctx_tag(&mut body, ctx::OBJECT_IDENTIFIER, Lvt::Length(4)).unwrap();
        body.extend_from_slice(&object.to_u32().to_be_bytes());
        ctx_tag(&mut body, ctx::LIST_OF_PROPERTIES, Lvt::Open).unwrap();
        ctx_tag(&mut body, ctx::PROPERTY_IDENTIFIER, Lvt::Length(1)).unwrap();
        body.push(PropertyIdentifier::PresentValue.as_u32() as u8);
        ctx_tag(&mut body, ctx::PROPERTY_VALUE, Lvt::Open).unwrap();
        encode_primitive(&mut body, &Primitive::Real(21.5)).unwrap();
        ctx_tag(&mut body, ctx::PROPERTY_VALUE, Lvt::Close).unwrap();
        ctx_tag(&mut body, ctx::LIST_OF_PROPERTIES, Lvt::Close).unwrap();

        let mut apdu = vec![(ApduType::ComplexAck as u8) << 4, 1, SERVICE_READ_PROPERTY_MULTIPLE];
        apdu.extend_from_slice(&body);

        let state = decode_read_property_multiple_ack(&apdu).unwrap();
        assert_eq!(
            state.get(object, PropertyIdentifier::PresentValue),
            Some(&PropertyValue::Real(21.5))
        );
    }

    // S3: PRIORITY_ARRAY with slot 8 (index 7) set to 22.0, all fifteen others Null.
    #[test]
    fn decode_priority_array_has_sixteen_elements() {
        let object = ObjectIdentifier::new(ObjectType::AnalogValue, 127);
        let mut body = Vec::new();
        ctx_tag(&mut body, ctx::OBJECT_IDENTIFIER, Lvt::Length(4)).unwrap();
        body.extend_from_slice(&object.to_u32().to_be_bytes());
        ctx_tag(&mut body, ctx::LIST_OF_PROPERTIES, Lvt::Open).unwrap();
        ctx_tag(&mut body, ctx::PROPERTY_IDENTIFIER, Lvt::Length(1)).unwrap();
        body.push(PropertyIdentifier::PriorityArray.as_u32() as u8);
        ctx_tag(&mut body, ctx::PROPERTY_VALUE, Lvt::Open).unwrap();
        for slot in 0..16 {
            if slot == 7 {
                encode_primitive(&mut body, &Primitive::Real(22.0)).unwrap();
            } else {
                encode_primitive(&mut body, &Primitive::Null).unwrap();
            }
        }
        ctx_tag(&mut body, ctx::PROPERTY_VALUE, Lvt::Close).unwrap();
        ctx_tag(&mut body, ctx::LIST_OF_PROPERTIES, Lvt::Close).unwrap();

        let mut apdu = vec![(ApduType::ComplexAck as u8) << 4, 1, SERVICE_READ_PROPERTY_MULTIPLE];
        apdu.extend_from_slice(&body);

        let state = decode_read_property_multiple_ack(&apdu).unwrap();
        match state.get(object, PropertyIdentifier::PriorityArray).unwrap() {
            PropertyValue::PriorityArray(slots) => {
                assert_eq!(slots.len(), 16);
                assert_eq!(slots[7], PropertyValue::Real(22.0));
                assert_eq!(slots[0], PropertyValue::Null);
            }
            other => panic!("expected PriorityArray, got {other:?}"),
        }
    }

    #[test]
    fn decode_priority_array_all_null_still_yields_sixteen_elements() {
        let object = ObjectIdentifier::new(ObjectType::AnalogValue, 131);
        let mut body = Vec::new();
        ctx_tag(&mut body, ctx::OBJECT_IDENTIFIER, Lvt::Length(4)).unwrap();
        body.extend_from_slice(&object.to_u32().to_be_bytes());
        ctx_tag(&mut body, ctx::LIST_OF_PROPERTIES, Lvt::Open).unwrap();
        ctx_tag(&mut body, ctx::PROPERTY_IDENTIFIER, Lvt::Length(1)).unwrap();
        body.push(PropertyIdentifier::PriorityArray.as_u32() as u8);
        ctx_tag(&mut body, ctx::PROPERTY_VALUE, Lvt::Open).unwrap();
        for _ in 0..16 {
            encode_primitive(&mut body, &Primitive::Null).unwrap();
        }
        ctx_tag(&mut body, ctx::PROPERTY_VALUE, Lvt::Close).unwrap();
        ctx_tag(&mut body, ctx::LIST_OF_PROPERTIES, Lvt::Close).unwrap();

        let mut apdu = vec![(ApduType::ComplexAck as u8) << 4, 1, SERVICE_READ_PROPERTY_MULTIPLE];
        apdu.extend_from_slice(&body);

        let state = decode_read_property_multiple_ack(&apdu).unwrap();
        match state.get(object, PropertyIdentifier::PriorityArray).unwrap() {
            PropertyValue::PriorityArray(slots) => {
                assert_eq!(slots.len(), 16);
                assert!(slots.iter().all(|s| *s == PropertyValue::Null));
            }
            other => panic!("expected PriorityArray, got {other:?}"),
        }
    }

    #[test]
    fn decode_access_error_surfaces_both_codes() {
        let object = ObjectIdentifier::new(ObjectType::AnalogValue, 9999);
        let mut body = Vec::new();
        ctx_tag(&mut body, ctx::OBJECT_IDENTIFIER, Lvt::Length(4)).unwrap();
        body.extend_from_slice(&object.to_u32().to_be_bytes());
        ctx_tag(&mut body, ctx::LIST_OF_PROPERTIES, Lvt::Open).unwrap();
        ctx_tag(&mut body, ctx::PROPERTY_IDENTIFIER, Lvt::Length(1)).unwrap();
        body.push(PropertyIdentifier::PresentValue.as_u32() as u8);
        ctx_tag(&mut body, ctx::PROPERTY_ACCESS_ERROR, Lvt::Open).unwrap();
        encode_primitive(&mut body, &Primitive::Enumerated(1)).unwrap(); // unknown-object
        encode_primitive(&mut body, &Primitive::Enumerated(31)).unwrap(); // unknown-property
        ctx_tag(&mut body, ctx::PROPERTY_ACCESS_ERROR, Lvt::Close).unwrap();
        ctx_tag(&mut body, ctx::LIST_OF_PROPERTIES, Lvt::Close).unwrap();

        let mut apdu = vec![(ApduType::ComplexAck as u8) << 4, 1, SERVICE_READ_PROPERTY_MULTIPLE];
        apdu.extend_from_slice(&body);

        let state = decode_read_property_multiple_ack(&apdu).unwrap();
        assert_eq!(
            state.get(object, PropertyIdentifier::PresentValue),
            Some(&PropertyValue::AccessError { error_class: 1, error_code: 31 })
        );
    }

    // S4: WriteProperty (ANALOG_VALUE, 127) = Real(20.5) at priority 16.
    #[test]
    fn encode_write_property_analog_value_with_priority() {
        let descriptor = PropertyDescriptor::new(ObjectType::AnalogValue, 127).with_priority(16);
        let apdu = encode_write_property(&descriptor, &PropertyValue::Real(20.5)).unwrap();
        let mut expected_primitive = Vec::new();
        encode_primitive(&mut expected_primitive, &Primitive::Real(20.5)).unwrap();
        assert_eq!(expected_primitive, vec![0x44, 0x41, 0xA4, 0x00, 0x00]);
        assert!(apdu.windows(expected_primitive.len()).any(|w| w == expected_primitive.as_slice()));
        assert_eq!(apdu[apdu.len() - 2], 0x49); // ctx-tag 4, len 1 (priority)
        assert_eq!(*apdu.last().unwrap(), 16);
    }

    #[test]
    fn write_type_hint_is_ignored_for_analog_value_but_honoured_for_others() {
        // AnalogValue always writes Real regardless of the hint.
        let descriptor = PropertyDescriptor::new(ObjectType::AnalogValue, 134).with_write_type(WriteType::Enumerated);
        let apdu = encode_write_property(&descriptor, &PropertyValue::Real(1.0)).unwrap();
        let mut expected = Vec::new();
        encode_primitive(&mut expected, &Primitive::Real(1.0)).unwrap();
        assert!(apdu.windows(expected.len()).any(|w| w == expected.as_slice()));

        // PositiveIntegerValue has no type-implied primitive, so the hint picks Enumerated
        // over the UnsignedInt default.
        let descriptor =
            PropertyDescriptor::new(ObjectType::PositiveIntegerValue, 1).with_write_type(WriteType::Enumerated);
        let apdu = encode_write_property(&descriptor, &PropertyValue::Enumerated(3)).unwrap();
        let mut expected = Vec::new();
        encode_primitive(&mut expected, &Primitive::Enumerated(3)).unwrap();
        assert!(apdu.windows(expected.len()).any(|w| w == expected.as_slice()));
    }

    // S5: WriteProperty with Null (relinquish).
    #[test]
    fn encode_write_property_null_relinquishes() {
        let descriptor = PropertyDescriptor::new(ObjectType::AnalogValue, 127);
        let apdu = encode_write_property(&descriptor, &PropertyValue::Null).unwrap();
        // ctx-tag 3 open, app-tag 0 len 0, ctx-tag 3 close: 0x3E 0x00 0x3F
        assert!(apdu.windows(3).any(|w| w == [0x3E, 0x00, 0x3F]));
    }

    #[test]
    fn decode_simple_ack_validates_invoke_id_and_service() {
        let apdu = [(ApduType::SimpleAck as u8) << 4, 1, SERVICE_WRITE_PROPERTY];
        decode_simple_ack(&apdu, 1, SERVICE_WRITE_PROPERTY).unwrap();
        assert_eq!(
            decode_simple_ack(&apdu, 2, SERVICE_WRITE_PROPERTY),
            Err(DecodeError::UnexpectedInvokeId { expected: 2, got: 1 })
        );
        assert_eq!(
            decode_simple_ack(&apdu, 1, SERVICE_READ_PROPERTY_MULTIPLE),
            Err(DecodeError::UnexpectedServiceChoice { expected: SERVICE_READ_PROPERTY_MULTIPLE, got: SERVICE_WRITE_PROPERTY })
        );
    }

    #[test]
    fn write_property_rejects_value_incompatible_with_object_type() {
        let descriptor = PropertyDescriptor::new(ObjectType::AnalogValue, 134);
        let err = encode_write_property(&descriptor, &PropertyValue::Enumerated(1)).unwrap_err();
        assert_eq!(err, EncodeError::IncompatibleValue { object_type: ObjectType::AnalogValue.as_u32(), tag: 4 });
    }
}
