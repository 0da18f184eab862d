use std::{
    any::{Any, TypeId},
    collections::{hash_map::Entry, HashMap},
    future::Future,
    marker::PhantomData,
    sync::Arc,
};

use async_graphql_value::ConstValue;
use futures::{
    future::{self, BoxFuture},
    FutureExt,
};
use indexmap::IndexMap;

use crate::{
    FromArgument, HostInstance, HostObject, HostValue, IntoHostValue, InvocationError, Param, ResolverError, ValueKind,
};

pub(crate) type PropertyFn = dyn Fn(&HostObject) -> Result<HostValue, InvocationError> + Send + Sync;
pub(crate) type MethodFn =
    dyn Fn(&HostObject, Vec<ConstValue>) -> BoxFuture<'static, Result<HostValue, InvocationError>> + Send + Sync;
pub(crate) type SetterFn = dyn Fn(&mut HostInstance, ConstValue) -> Result<(), InvocationError> + Send + Sync;
pub(crate) type ConstructorFn = dyn Fn(Vec<ConstValue>) -> Result<HostInstance, InvocationError> + Send + Sync;

#[derive(Clone)]
pub(crate) enum MemberKind {
    Property(Arc<PropertyFn>),
    Method {
        params: Arc<[Param]>,
        call: Arc<MethodFn>,
        asynchronous: bool,
    },
    Setter {
        param: Param,
        set: Arc<SetterFn>,
    },
}

/// A typed member implementation on the host type `T`, before it gets a name.
pub struct Member<T> {
    pub(crate) kind: MemberKind,
    _marker: PhantomData<fn(&T)>,
}

/// How a member is called, as far as the schema is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberShape<'a> {
    Property,
    Method { params: &'a [Param], asynchronous: bool },
    Setter,
}

fn source_mismatch<T: Any>(actual: &'static str) -> InvocationError {
    InvocationError::SourceMismatch {
        expected: std::any::type_name::<T>(),
        actual,
    }
}

fn source<T: Any>(target: &HostObject) -> Result<&T, InvocationError> {
    target
        .downcast_ref::<T>()
        .ok_or_else(|| source_mismatch::<T>(target.type_name()))
}

fn shared_source<T: Any + Send + Sync>(target: &HostObject) -> Result<Arc<T>, InvocationError> {
    target
        .downcast_arc::<T>()
        .ok_or_else(|| source_mismatch::<T>(target.type_name()))
}

fn take<A: FromArgument>(args: &mut std::vec::IntoIter<ConstValue>, name: &'static str) -> Result<A, InvocationError> {
    A::from_argument(args.next().unwrap_or(ConstValue::Null))
        .map_err(|reason| InvocationError::invalid_argument(name, reason))
}

impl<T: Any + Send + Sync> Member<T> {
    fn new(kind: MemberKind) -> Self {
        Member {
            kind,
            _marker: PhantomData,
        }
    }

    pub fn shape(&self) -> MemberShape<'_> {
        match &self.kind {
            MemberKind::Property(_) => MemberShape::Property,
            MemberKind::Method {
                params, asynchronous, ..
            } => MemberShape::Method {
                params,
                asynchronous: *asynchronous,
            },
            MemberKind::Setter { .. } => MemberShape::Setter,
        }
    }

    pub fn property<R, F>(get: F) -> Self
    where
        R: IntoHostValue,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        Member::new(MemberKind::Property(Arc::new(move |target: &HostObject| {
            source::<T>(target).map(|this| get(this).into_host_value())
        })))
    }

    pub fn setter<V, F>(set: F) -> Self
    where
        V: FromArgument,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let param = Param::of::<V>("value");
        Member::new(MemberKind::Setter {
            param,
            set: Arc::new(move |instance: &mut HostInstance, value: ConstValue| {
                let actual = instance.type_name();
                let this = instance
                    .downcast_mut::<T>()
                    .ok_or_else(|| source_mismatch::<T>(actual))?;
                let value = V::from_argument(value).map_err(|reason| InvocationError::invalid_argument("value", reason))?;
                set(this, value);
                Ok(())
            }),
        })
    }

    pub fn method0<R, F>(f: F) -> Self
    where
        R: IntoHostValue,
        F: Fn(&T) -> Result<R, ResolverError> + Send + Sync + 'static,
    {
        Member::new(MemberKind::Method {
            params: Arc::new([]),
            call: Arc::new(move |target: &HostObject, _: Vec<ConstValue>| {
                let result = source::<T>(target).and_then(|this| {
                    f(this)
                        .map(IntoHostValue::into_host_value)
                        .map_err(InvocationError::from)
                });
                future::ready(result).boxed()
            }),
            asynchronous: false,
        })
    }

    pub fn async_method0<R, Fut, F>(f: F) -> Self
    where
        R: IntoHostValue,
        Fut: Future<Output = Result<R, ResolverError>> + Send + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
    {
        Member::new(MemberKind::Method {
            params: Arc::new([]),
            call: Arc::new(move |target: &HostObject, _: Vec<ConstValue>| match shared_source::<T>(target) {
                Ok(this) => f(this)
                    .map(|result| result.map(IntoHostValue::into_host_value).map_err(InvocationError::from))
                    .boxed(),
                Err(err) => future::ready(Err(err)).boxed(),
            }),
            asynchronous: true,
        })
    }
}

macro_rules! typed_arities {
    ($($n:literal: $extract:ident, $method:ident, $async_method:ident, $constructor:ident => ($($A:ident $a:ident $i:tt),+));+ $(;)?) => {
        $(
            fn $extract<$($A: FromArgument),+>(
                args: Vec<ConstValue>,
                params: [&'static str; $n],
            ) -> Result<($($A,)+), InvocationError> {
                let mut args = args.into_iter();
                Ok(($(take::<$A>(&mut args, params[$i])?,)+))
            }

            impl<T: Any + Send + Sync> Member<T> {
                pub fn $method<$($A,)+ R, F>(params: [&'static str; $n], f: F) -> Self
                where
                    $($A: FromArgument,)+
                    R: IntoHostValue,
                    F: Fn(&T, $($A),+) -> Result<R, ResolverError> + Send + Sync + 'static,
                {
                    Member::new(MemberKind::Method {
                        params: Arc::new([$(Param::of::<$A>(params[$i])),+]),
                        call: Arc::new(move |target: &HostObject, args: Vec<ConstValue>| {
                            let result = source::<T>(target).and_then(|this| {
                                let ($($a,)+) = $extract::<$($A),+>(args, params)?;
                                f(this, $($a),+)
                                    .map(IntoHostValue::into_host_value)
                                    .map_err(InvocationError::from)
                            });
                            future::ready(result).boxed()
                        }),
                        asynchronous: false,
                    })
                }

                pub fn $async_method<$($A,)+ R, Fut, F>(params: [&'static str; $n], f: F) -> Self
                where
                    $($A: FromArgument,)+
                    R: IntoHostValue,
                    Fut: Future<Output = Result<R, ResolverError>> + Send + 'static,
                    F: Fn(Arc<T>, $($A),+) -> Fut + Send + Sync + 'static,
                {
                    Member::new(MemberKind::Method {
                        params: Arc::new([$(Param::of::<$A>(params[$i])),+]),
                        call: Arc::new(move |target: &HostObject, args: Vec<ConstValue>| {
                            let prepared = shared_source::<T>(target)
                                .and_then(|this| $extract::<$($A),+>(args, params).map(|args| (this, args)));
                            match prepared {
                                Ok((this, ($($a,)+))) => f(this, $($a),+)
                                    .map(|result| result.map(IntoHostValue::into_host_value).map_err(InvocationError::from))
                                    .boxed(),
                                Err(err) => future::ready(Err(err)).boxed(),
                            }
                        }),
                        asynchronous: true,
                    })
                }
            }

            impl<T: Any + Send + Sync> Constructor<T> {
                pub fn $constructor<$($A,)+ F>(params: [&'static str; $n], f: F) -> Self
                where
                    $($A: FromArgument,)+
                    F: Fn($($A),+) -> T + Send + Sync + 'static,
                {
                    Constructor {
                        params: Arc::new([$(Param::of::<$A>(params[$i])),+]),
                        construct: Arc::new(move |args: Vec<ConstValue>| {
                            let ($($a,)+) = $extract::<$($A),+>(args, params)?;
                            Ok(HostInstance::new(f($($a),+)))
                        }),
                        _marker: PhantomData,
                    }
                }
            }
        )+
    };
}

typed_arities! {
    1: extract1, method1, async_method1, new1 => (A a 0);
    2: extract2, method2, async_method2, new2 => (A a 0, B b 1);
    3: extract3, method3, async_method3, new3 => (A a 0, B b 1, C c 2);
}

/// A typed constructor of the host type `T`.
pub struct Constructor<T> {
    params: Arc<[Param]>,
    construct: Arc<ConstructorFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Constructor<T> {
    pub fn new0<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Constructor {
            params: Arc::new([]),
            construct: Arc::new(move |_: Vec<ConstValue>| Ok(HostInstance::new(f()))),
            _marker: PhantomData,
        }
    }

    /// A constructor of any arity receiving the coerced argument values in
    /// parameter order.
    pub fn untyped<F>(params: Vec<Param>, f: F) -> Self
    where
        F: Fn(Vec<ConstValue>) -> Result<T, ResolverError> + Send + Sync + 'static,
    {
        Constructor {
            params: params.into(),
            construct: Arc::new(move |args: Vec<ConstValue>| Ok(HostInstance::new(f(args)?))),
            _marker: PhantomData,
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

#[derive(Clone)]
pub(crate) struct ConstructorEntry {
    pub params: Arc<[Param]>,
    pub construct: Arc<ConstructorFn>,
}

/// Members and constructors of one host type, with names attached.
pub struct HostType {
    type_id: TypeId,
    type_name: &'static str,
    members: IndexMap<Box<str>, MemberKind>,
    constructors: Vec<ConstructorEntry>,
}

impl HostType {
    pub fn builder<T: Any + Send + Sync>() -> HostTypeBuilder<T> {
        HostTypeBuilder {
            ty: HostType {
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
                members: IndexMap::new(),
                constructors: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.members.keys().map(AsRef::as_ref)
    }

    pub(crate) fn member(&self, name: &str) -> Option<&MemberKind> {
        self.members.get(name)
    }

    /// First constructor whose parameters accept arguments of the given kinds.
    pub(crate) fn constructor_for(&self, kinds: &[ValueKind]) -> Option<&ConstructorEntry> {
        self.constructors.iter().find(|entry| {
            entry.params.len() == kinds.len()
                && entry.params.iter().zip(kinds).all(|(param, kind)| param.accepts(*kind))
        })
    }

    fn merge(&mut self, other: HostType) {
        self.members.extend(other.members);
        self.constructors.extend(other.constructors);
    }
}

pub struct HostTypeBuilder<T> {
    ty: HostType,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Any + Send + Sync> HostTypeBuilder<T> {
    #[must_use]
    pub fn member(mut self, name: impl Into<Box<str>>, member: Member<T>) -> Self {
        self.ty.members.insert(name.into(), member.kind);
        self
    }

    #[must_use]
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.ty.constructors.push(ConstructorEntry {
            params: constructor.params,
            construct: constructor.construct,
        });
        self
    }

    pub fn build(self) -> HostType {
        self.ty
    }
}

/// Every host type the schema binds resolvers to.
#[derive(Default)]
pub struct HostRegistry {
    types: HashMap<TypeId, HostType>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host type, merging members into an earlier registration
    /// of the same Rust type.
    pub fn register(&mut self, ty: HostType) {
        match self.types.entry(ty.type_id) {
            Entry::Occupied(mut entry) => entry.get_mut().merge(ty),
            Entry::Vacant(entry) => {
                entry.insert(ty);
            }
        }
    }

    pub fn get(&self, type_id: TypeId) -> Option<&HostType> {
        self.types.get(&type_id)
    }

    pub fn type_name(&self, type_id: TypeId) -> Option<&'static str> {
        self.get(type_id).map(HostType::type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl std::fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.types.values().map(HostType::type_name))
            .finish()
    }
}
