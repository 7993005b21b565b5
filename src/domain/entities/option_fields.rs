use serde::{Deserialize, Deserializer, Serialize};

/// Three-way field semantics for PATCH requests.
///
/// - `Unchanged` → key absent from the body
/// - `Clear` → explicit `null`, or text that is blank once trimmed
/// - `Set` → new value
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub enum PatchField<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

/// Use with `#[serde(default, deserialize_with = "deserialize_patch")]`:
/// serde only calls this when the key is present, so a missing key stays
/// `Unchanged` and `null` becomes `Clear`.
pub fn deserialize_patch<'de, D, T>(deserializer: D) -> Result<PatchField<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<T>::deserialize(deserializer)? {
        Some(value) => PatchField::Set(value),
        None => PatchField::Clear,
    })
}

impl<T> PatchField<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }

    pub fn value_ref(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }

    /// Nested option view: `None` unchanged, `Some(None)` clear, `Some(Some(v))` set.
    pub fn as_ref_option(&self) -> Option<Option<&T>> {
        match self {
            Self::Unchanged => None,
            Self::Clear => Some(None),
            Self::Set(value) => Some(Some(value)),
        }
    }

    pub fn map_value<U, F: FnOnce(T) -> U>(self, f: F) -> PatchField<U> {
        match self {
            Self::Unchanged => PatchField::Unchanged,
            Self::Clear => PatchField::Clear,
            Self::Set(value) => PatchField::Set(f(value)),
        }
    }
}

impl<T: Clone> PatchField<T> {
    /// Writes the change into `target`, leaving it alone when unchanged.
    pub fn apply_to(&self, target: &mut Option<T>) {
        match self {
            Self::Unchanged => {}
            Self::Clear => *target = None,
            Self::Set(value) => *target = Some(value.clone()),
        }
    }
}

impl PatchField<String> {
    /// Trims the value; blank text clears the field.
    pub fn normalized(self) -> Self {
        match self {
            Self::Set(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Self::Clear
                } else {
                    Self::Set(trimmed.to_string())
                }
            }
            other => other,
        }
    }

    pub fn as_str_option(&self) -> Option<Option<&str>> {
        self.as_ref_option().map(|inner| inner.map(String::as_str))
    }
}

impl<T> From<Option<Option<T>>> for PatchField<T> {
    fn from(opt: Option<Option<T>>) -> Self {
        match opt {
            None => PatchField::Unchanged,
            Some(None) => PatchField::Clear,
            Some(Some(value)) => PatchField::Set(value),
        }
    }
}
