//! Serde helpers for configuration deserialization.

use aggregator_types::NetworkId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Custom deserializer for `HashMap<NetworkId, T>` that handles string keys.
pub fn deserialize_network_id_map<'de, D, T>(
	deserializer: D,
) -> Result<HashMap<NetworkId, T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	let map = HashMap::<String, T>::deserialize(deserializer)?;

	map.into_iter()
		.map(|(k, v)| {
			k.parse::<u64>()
				.map(|id| (NetworkId(id), v))
				.map_err(|_| serde::de::Error::custom(format!("Invalid network ID: {}", k)))
		})
		.collect()
}

/// Custom serializer for `HashMap<NetworkId, T>` that converts network ids
/// to string keys.
pub fn serialize_network_id_map<S, T>(
	map: &HashMap<NetworkId, T>,
	serializer: S,
) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	let string_map: HashMap<String, &T> = map.iter().map(|(k, v)| (k.0.to_string(), v)).collect();

	string_map.serialize(serializer)
}
