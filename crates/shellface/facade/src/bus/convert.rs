//! Conversion between bus variants and facade [`Value`]s.

use std::collections::{BTreeMap, HashMap};

use shellface_proto::{CallError, Reply, Value};
use zbus::zvariant::{OwnedValue, Value as ZValue};

use super::error::ShellError;

/// Converts a bus value into a facade value.
///
/// Integer widths collapse onto `u32`/`i32`, 64-bit integers widen to
/// doubles, and paths and signatures become strings.
pub(crate) fn from_bus(value: &ZValue<'_>) -> Result<Value, CallError> {
	let value = match value {
		ZValue::Bool(b) => Value::Bool(*b),
		ZValue::U8(n) => Value::U32(u32::from(*n)),
		ZValue::U16(n) => Value::U32(u32::from(*n)),
		ZValue::U32(n) => Value::U32(*n),
		ZValue::I16(n) => Value::I32(i32::from(*n)),
		ZValue::I32(n) => Value::I32(*n),
		ZValue::I64(n) => Value::Double(*n as f64),
		ZValue::U64(n) => Value::Double(*n as f64),
		ZValue::F64(n) => Value::Double(*n),
		ZValue::Str(s) => Value::Str(s.to_string()),
		ZValue::ObjectPath(p) => Value::Str(p.to_string()),
		ZValue::Signature(s) => Value::Str(s.to_string()),
		ZValue::Value(inner) => from_bus(inner)?,
		ZValue::Array(items) => Value::Array(items.iter().map(from_bus).collect::<Result<_, _>>()?),
		ZValue::Structure(s) => Value::Struct(s.fields().iter().map(from_bus).collect::<Result<_, _>>()?),
		ZValue::Dict(_) => {
			let owned = value
				.try_clone()
				.map_err(|e| CallError::invalid(format!("unreadable dictionary: {e}")))?;
			let entries = HashMap::<String, OwnedValue>::try_from(owned)
				.map_err(|e| CallError::invalid(format!("dictionary keys must be strings: {e}")))?;
			Value::Dict(dict_from_bus(&entries)?)
		}
		#[allow(unreachable_patterns)]
		_ => return Err(CallError::invalid("unsupported value type")),
	};
	Ok(value)
}

/// Converts an `a{sv}` argument.
pub(crate) fn dict_from_bus(entries: &HashMap<String, OwnedValue>) -> Result<BTreeMap<String, Value>, CallError> {
	entries
		.iter()
		.map(|(key, value)| Ok((key.clone(), from_bus(value)?)))
		.collect()
}

/// Converts a facade value into a bus value.
///
/// Structs and arrays are published as `av`, which is all the facade ever
/// sends outside typed replies.
pub(crate) fn to_bus(value: &Value) -> ZValue<'static> {
	match value {
		Value::Bool(b) => ZValue::Bool(*b),
		Value::U32(n) => ZValue::U32(*n),
		Value::I32(n) => ZValue::I32(*n),
		Value::Double(n) => ZValue::F64(*n),
		Value::Str(s) => ZValue::from(s.clone()),
		Value::Array(items) | Value::Struct(items) => {
			ZValue::from(items.iter().map(to_bus).collect::<Vec<ZValue<'static>>>())
		}
		Value::Dict(entries) => ZValue::from(dict_to_bus(entries)),
	}
}

/// Converts a facade dictionary into an `a{sv}` map.
pub(crate) fn dict_to_bus(entries: &BTreeMap<String, Value>) -> HashMap<String, ZValue<'static>> {
	entries.iter().map(|(k, v)| (k.clone(), to_bus(v))).collect()
}

/// Takes the first reply value through `extract`.
///
/// A mismatch means the dispatcher and the skeleton disagree on a signature,
/// which is reported as a transport failure.
pub(crate) fn reply_value<T>(reply: Reply, expected: &'static str, extract: impl FnOnce(Value) -> Option<T>) -> Result<T, ShellError> {
	reply
		.0
		.into_iter()
		.next()
		.and_then(extract)
		.ok_or_else(|| ShellError::ZBus(zbus::Error::Failure(format!("reply is not {expected}"))))
}

pub(crate) fn bool_of(value: Value) -> Option<bool> {
	value.as_bool()
}

pub(crate) fn u32_of(value: Value) -> Option<u32> {
	value.as_u32()
}

pub(crate) fn string_of(value: Value) -> Option<String> {
	match value {
		Value::Str(s) => Some(s),
		_ => None,
	}
}

pub(crate) fn dict_of(value: Value) -> Option<BTreeMap<String, Value>> {
	match value {
		Value::Dict(entries) => Some(entries),
		_ => None,
	}
}

pub(crate) fn u32_array_of(value: Value) -> Option<Vec<u32>> {
	match value {
		Value::Array(items) => items.iter().map(Value::as_u32).collect(),
		_ => None,
	}
}

pub(crate) fn string_array_of(value: Value) -> Option<Vec<String>> {
	match value {
		Value::Array(items) => items.into_iter().map(string_of).collect(),
		_ => None,
	}
}
