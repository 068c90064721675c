use serde::{Deserialize, Serialize};

/// One unconfirmed transaction as delivered by the mempool stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub signature: String,
    pub recent_blockhash: String,
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub source: String,
    pub account_keys: Vec<String>,
    #[serde(default)]
    pub address_table_lookups: Vec<AddressTableLookup>,
    pub instructions: Vec<RawInstruction>,
    #[serde(default)]
    pub pre_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub post_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressTableLookup {
    pub account_key: String,
    #[serde(default)]
    pub writable_indexes: Vec<u8>,
    #[serde(default)]
    pub readonly_indexes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    pub program_id_index: u32,
    pub accounts: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// Token balance snapshot; `amount` is the raw integer amount as a decimal string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: u32,
    pub mint: String,
    #[serde(default)]
    pub owner: String,
    pub amount: String,
}

impl RawEvent {
    pub fn is_failed(&self) -> bool {
        self.error.as_deref().map_or(false, |e| !e.is_empty())
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
