//! EmpirBus application-specific data models.
//!
//! EmpirBus defines five payload layouts for PGN 65280. Data Model 2
//! (2 dimmer words + 8 switch bits) is the one implemented here; the other
//! variants are selectable in configuration but have no codec yet.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::EMPIRBUS_PAYLOAD_LEN;
use crate::error::EmpirBusError;
use crate::nxt::frame::{decode, decode_strict, encode, ModuleState};

/// Selector for the EmpirBus payload layout, 1..=5 in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DataModel {
    Model1,
    #[default]
    Model2,
    Model3,
    Model4,
    Model5,
}

impl DataModel {
    pub const ALL: [DataModel; 5] = [
        DataModel::Model1,
        DataModel::Model2,
        DataModel::Model3,
        DataModel::Model4,
        DataModel::Model5,
    ];

    pub fn number(self) -> u8 {
        match self {
            DataModel::Model1 => 1,
            DataModel::Model2 => 2,
            DataModel::Model3 => 3,
            DataModel::Model4 => 4,
            DataModel::Model5 => 5,
        }
    }

    /// Codec for this layout
    pub fn codec(self, strict_tags: bool) -> Result<Box<dyn FrameCodec>, EmpirBusError> {
        match self {
            DataModel::Model2 => Ok(Box::new(DataModel2Codec { strict_tags })),
            other => Err(EmpirBusError::UnsupportedDataModel(other.number())),
        }
    }

    pub fn is_supported(self) -> bool {
        self.codec(false).is_ok()
    }
}

impl TryFrom<u8> for DataModel {
    type Error = EmpirBusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DataModel::ALL
            .into_iter()
            .find(|m| m.number() == value)
            .ok_or(EmpirBusError::UnsupportedDataModel(value))
    }
}

impl From<DataModel> for u8 {
    fn from(model: DataModel) -> Self {
        model.number()
    }
}

impl fmt::Display for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model {}", self.number())
    }
}

/// Payload codec for one data model
pub trait FrameCodec: Send + Sync + fmt::Debug {
    fn data_model(&self) -> DataModel;

    fn decode(&self, payload: &[u8]) -> Result<ModuleState, EmpirBusError>;

    fn encode(&self, state: &ModuleState) -> Result<[u8; EMPIRBUS_PAYLOAD_LEN], EmpirBusError>;
}

/// Data Model 2: 2x u16 dimmer + 8x 1-bit switch
#[derive(Debug, Clone, Copy, Default)]
pub struct DataModel2Codec {
    pub strict_tags: bool,
}

impl FrameCodec for DataModel2Codec {
    fn data_model(&self) -> DataModel {
        DataModel::Model2
    }

    fn decode(&self, payload: &[u8]) -> Result<ModuleState, EmpirBusError> {
        if self.strict_tags {
            decode_strict(payload)
        } else {
            decode(payload)
        }
    }

    fn encode(&self, state: &ModuleState) -> Result<[u8; EMPIRBUS_PAYLOAD_LEN], EmpirBusError> {
        encode(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_model_2_has_a_codec() {
        assert!(DataModel::Model2.is_supported());
        for model in [DataModel::Model1, DataModel::Model3, DataModel::Model4, DataModel::Model5] {
            assert!(matches!(
                model.codec(false),
                Err(EmpirBusError::UnsupportedDataModel(n)) if n == model.number()
            ));
        }
    }

    #[test]
    fn test_numbers_round_trip() {
        for model in DataModel::ALL {
            assert_eq!(DataModel::try_from(model.number()).unwrap(), model);
        }
        assert!(DataModel::try_from(0).is_err());
        assert!(DataModel::try_from(6).is_err());
        assert_eq!(DataModel::default(), DataModel::Model2);
        assert_eq!(DataModel::Model4.to_string(), "Model 4");
    }

    #[test]
    fn test_serde_uses_numbers() {
        assert_eq!(serde_json::to_string(&DataModel::Model2).unwrap(), "2");
        assert_eq!(serde_json::from_str::<DataModel>("5").unwrap(), DataModel::Model5);
        assert!(serde_json::from_str::<DataModel>("9").is_err());
    }

    #[test]
    fn test_strict_codec_checks_tag() {
        let codec = DataModel::Model2.codec(true).unwrap();
        assert_eq!(codec.data_model(), DataModel::Model2);
        let payload = [0x31, 0x99, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(codec.decode(&payload), Err(EmpirBusError::UnexpectedTag { .. })));
        let lenient = DataModel::Model2.codec(false).unwrap();
        assert!(lenient.decode(&payload).is_ok());
    }
}
