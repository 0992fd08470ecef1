// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

use super::{Ebid, Ecc};

/// (EBID, ECC) pair valid during one epoch.
///
/// Serialized as `{"epochId":100,"key":{"ebid":"TnO2cc+3OkY=","ecc":"lw=="}}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TupleJson", into = "TupleJson")]
pub struct EphemeralTuple {
    pub epoch_id: i32,
    pub ebid: Ebid,
    pub ecc: Ecc,
}

impl EphemeralTuple {
    pub fn new(epoch_id: i32, ebid: Ebid, ecc: Ecc) -> Self {
        EphemeralTuple {
            epoch_id,
            ebid,
            ecc,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TupleJson {
    epoch_id: i32,
    key: TupleKeyJson,
}

#[derive(Serialize, Deserialize)]
struct TupleKeyJson {
    ebid: Ebid,
    ecc: Ecc,
}

impl From<TupleJson> for EphemeralTuple {
    fn from(json: TupleJson) -> Self {
        EphemeralTuple::new(json.epoch_id, json.key.ebid, json.key.ecc)
    }
}

impl From<EphemeralTuple> for TupleJson {
    fn from(tuple: EphemeralTuple) -> Self {
        TupleJson {
            epoch_id: tuple.epoch_id,
            key: TupleKeyJson {
                ebid: tuple.ebid,
                ecc: tuple.ecc,
            },
        }
    }
}
