use std::any::type_name;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use super::{Mappable, RecordDescriptor, TypeDescriptor};

macro_rules! impl_scalar {
    ($variant:ident: $($t:ty),+ $(,)?) => {
        $(
            impl Mappable for $t {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::$variant
                }
            }
        )+
    };
}

impl_scalar!(Integer: i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_scalar!(Float: f32, f64);
impl_scalar!(Boolean: bool);
impl_scalar!(String: String, str, char);

impl Mappable for Cow<'_, str> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::String
    }
}

// Absent values are simply missing from an indexed document.
impl<T: Mappable> Mappable for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        T::type_descriptor()
    }
}

// ------------------------------ Sequences --------------------------------- //

macro_rules! impl_sequence {
    ($($t:ident),+ $(,)?) => {
        $(
            impl<T: Mappable> Mappable for $t<T> {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::sequence(T::type_descriptor())
                }
            }
        )+
    };
}

impl_sequence!(Vec, VecDeque, LinkedList, BTreeSet, HashSet);

impl<T: Mappable> Mappable for [T] {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::type_descriptor())
    }
}

impl<T: Mappable, const N: usize> Mappable for [T; N] {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::type_descriptor())
    }
}

// ------------------------------ References -------------------------------- //

macro_rules! impl_reference {
    ($($t:ident),+ $(,)?) => {
        $(
            impl<T: ?Sized> Mappable for $t<T> {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::Reference(type_name::<Self>().to_owned())
                }
            }
        )+
    };
}

impl_reference!(Box, Rc, Arc);

impl<T: ?Sized> Mappable for &T {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Reference(type_name::<Self>().to_owned())
    }
}

// ------------------------------- Maps ------------------------------------ //

impl<K, V> Mappable for HashMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Unknown(type_name::<Self>().to_owned())
    }
}

impl<K, V> Mappable for BTreeMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Unknown(type_name::<Self>().to_owned())
    }
}

impl Mappable for () {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Unknown(type_name::<Self>().to_owned())
    }
}

// ------------------------------ Timestamps -------------------------------- //

impl<Tz: TimeZone> Mappable for DateTime<Tz> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Record(RecordDescriptor::timestamp(type_name::<Self>()))
    }
}

macro_rules! impl_timestamp {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Mappable for $t {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::Record(RecordDescriptor::timestamp(type_name::<Self>()))
                }
            }
        )+
    };
}

impl_timestamp!(NaiveDateTime, NaiveDate, SystemTime);
