//! Serde helpers for the number encodings used by the node and the indexer.

/// Numbers that may arrive either as JSON numbers or as decimal strings.
pub(crate) mod stringly {
    use std::{fmt::Display, str::FromStr};

    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Str(String),
        Num(T),
    }

    pub(crate) fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Deserialize<'de>,
        T::Err: Display,
    {
        match Repr::<T>::deserialize(deserializer)? {
            Repr::Str(s) => s.parse().map_err(de::Error::custom),
            Repr::Num(n) => Ok(n),
        }
    }

    pub(crate) fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Display,
    {
        serializer.collect_str(value)
    }

    /// Same as the parent module, for optional fields.
    pub(crate) mod option {
        use std::{fmt::Display, str::FromStr};

        use serde::{de, Deserialize, Deserializer, Serializer};

        use super::Repr;

        pub(crate) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            D: Deserializer<'de>,
            T: FromStr + Deserialize<'de>,
            T::Err: Display,
        {
            match Option::<Repr<T>>::deserialize(deserializer)? {
                Some(Repr::Str(s)) => s.parse().map(Some).map_err(de::Error::custom),
                Some(Repr::Num(n)) => Ok(Some(n)),
                None => Ok(None),
            }
        }

        pub(crate) fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
            T: Display,
        {
            match value {
                Some(v) => serializer.collect_str(v),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// `u128` amounts encoded as `0x`-prefixed hex strings, as returned by the account endpoint.
pub(crate) mod hex_u128 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        u128::from_str_radix(digits, 16).map_err(de::Error::custom)
    }

    pub(crate) fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&format_args!("0x{value:032x}"))
    }
}
