//! Prototype tagging (spec §3): the shape of an expected type, as seen by
//! `CandidateFilter`.

/// The expected-type shape a search is conducted against. `Value` is an
/// ordinary expected type; `View` and `Selection` are the two
/// conversion-search shapes dotc's type checker tags an expected type
/// with when it is about to look for an implicit conversion.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Prototype<T> {
    /// An ordinary expected type.
    Value(T),
    /// `argType => resType`: we are searching for a conversion from
    /// `argType` to (something convertible into) `resType`. `res_type`
    /// is itself a prototype, not a bare type, since `inferView` tags it
    /// as a `Selection` prototype when the conversion is being searched
    /// on behalf of a member lookup (spec §4.4's Extension case: "resType
    /// is a SelectionProto").
    View {
        arg_type: T,
        res_type: Box<Prototype<T>>,
    },
    /// We are searching for something with a member named `name` of type
    /// `member_type`; `private_ok` cancels the usual private-member
    /// accessibility restriction (used when probing for extension
    /// methods from `inferView`, spec §6).
    Selection {
        name: String,
        member_type: T,
        private_ok: bool,
    },
}

impl<T> Prototype<T> {
    pub fn is_view(&self) -> bool {
        matches!(self, Prototype::View { .. })
    }

    pub fn is_selection(&self) -> bool {
        matches!(self, Prototype::Selection { .. })
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Prototype::Value(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<(&T, &Prototype<T>)> {
        match self {
            Prototype::View { arg_type, res_type } => Some((arg_type, res_type)),
            _ => None,
        }
    }

    pub fn as_selection(&self) -> Option<(&str, &T, bool)> {
        match self {
            Prototype::Selection {
                name,
                member_type,
                private_ok,
            } => Some((name.as_str(), member_type, *private_ok)),
            _ => None,
        }
    }
}
