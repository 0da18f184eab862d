use std::{
    any::{Any, TypeId},
    fmt,
    sync::Arc,
};

use async_graphql_value::ConstValue;

/// A Rust value that owns resolver members, shared between the fields
/// resolved on it.
#[derive(Clone)]
pub struct HostObject {
    inner: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl HostObject {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        HostObject {
            inner: value,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast().ok()
    }

    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostObject").field(&self.type_name).finish()
    }
}

/// A host value still being built by a constructor and its setters.
pub struct HostInstance {
    value: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl HostInstance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        HostInstance {
            value: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    pub fn into_object(self) -> HostObject {
        HostObject {
            inner: Arc::from(self.value),
            type_id: self.type_id,
            type_name: self.type_name,
        }
    }
}

impl fmt::Debug for HostInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostInstance").field(&self.type_name).finish()
    }
}

/// Raw output of a member invocation.
#[derive(Debug, Clone, Default)]
pub enum HostValue {
    #[default]
    Null,
    Scalar(ConstValue),
    Object(HostObject),
    List(Vec<HostValue>),
}

impl HostValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null | HostValue::Scalar(ConstValue::Null))
    }

    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Scalar(a), HostValue::Scalar(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a.ptr_eq(b),
            (HostValue::List(a), HostValue::List(b)) => a == b,
            _ => false,
        }
    }
}

/// Conversion of a resolver's return value into a [`HostValue`].
pub trait IntoHostValue {
    fn into_host_value(self) -> HostValue;
}

impl IntoHostValue for HostValue {
    fn into_host_value(self) -> HostValue {
        self
    }
}

impl IntoHostValue for HostObject {
    fn into_host_value(self) -> HostValue {
        HostValue::Object(self)
    }
}

impl IntoHostValue for ConstValue {
    fn into_host_value(self) -> HostValue {
        match self {
            ConstValue::Null => HostValue::Null,
            value => HostValue::Scalar(value),
        }
    }
}

impl IntoHostValue for () {
    fn into_host_value(self) -> HostValue {
        HostValue::Null
    }
}

macro_rules! scalar_into_host_value {
    ($($ty:ty),*) => {
        $(
            impl IntoHostValue for $ty {
                fn into_host_value(self) -> HostValue {
                    HostValue::Scalar(ConstValue::from(self))
                }
            }
        )*
    };
}

scalar_into_host_value!(bool, i32, i64, u32, u64, String, &'static str);

impl IntoHostValue for f64 {
    fn into_host_value(self) -> HostValue {
        match serde_json::Number::from_f64(self) {
            Some(n) => HostValue::Scalar(ConstValue::Number(n)),
            None => HostValue::Null,
        }
    }
}

impl<T: IntoHostValue> IntoHostValue for Option<T> {
    fn into_host_value(self) -> HostValue {
        self.map_or(HostValue::Null, IntoHostValue::into_host_value)
    }
}

impl<T: IntoHostValue> IntoHostValue for Vec<T> {
    fn into_host_value(self) -> HostValue {
        HostValue::List(self.into_iter().map(IntoHostValue::into_host_value).collect())
    }
}

impl<T: Any + Send + Sync> IntoHostValue for Arc<T> {
    fn into_host_value(self) -> HostValue {
        HostValue::Object(HostObject::from_arc(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        name: &'static str,
    }

    #[test]
    fn host_object_downcasts() {
        let object = HostObject::new(User { name: "ada" });
        assert!(object.is::<User>());
        assert_eq!(object.downcast_ref::<User>().map(|u| u.name), Some("ada"));
        assert!(object.downcast_ref::<String>().is_none());
        assert!(object.downcast_arc::<User>().is_some());
        assert!(object.type_name().ends_with("User"));
    }

    #[test]
    fn instance_keeps_its_type_when_shared() {
        let mut instance = HostInstance::new(User { name: "ada" });
        if let Some(user) = instance.downcast_mut::<User>() {
            user.name = "grace";
        }
        let object = instance.into_object();
        assert!(object.is::<User>());
        assert_eq!(object.downcast_ref::<User>().map(|u| u.name), Some("grace"));
    }

    #[test]
    fn conversions() {
        assert_eq!(Some(3_i32).into_host_value(), HostValue::Scalar(ConstValue::from(3)));
        assert_eq!(None::<String>.into_host_value(), HostValue::Null);
        assert_eq!(
            vec!["a", "b"].into_host_value(),
            HostValue::List(vec![
                HostValue::Scalar(ConstValue::from("a")),
                HostValue::Scalar(ConstValue::from("b"))
            ])
        );
        let user = Arc::new(User { name: "ada" });
        let value = Arc::clone(&user).into_host_value();
        assert!(value.as_object().is_some_and(|object| object.is::<User>()));
    }
}
