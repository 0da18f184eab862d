use std::{any::TypeId, fmt, hash::Hash, sync::Arc};

use async_graphql_value::ConstValue;
use dashmap::DashMap;
use futures::{
    future::{self, BoxFuture},
    FutureExt,
};

use crate::{
    coerce,
    member::{ConstructorFn, MemberKind, MethodFn, PropertyFn, SetterFn},
    Arguments, HostInstance, HostObject, HostRegistry, HostType, HostValue, InvocationError, Param, ValueKind,
};

/// Identifies a member of a host type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub owner: TypeId,
    pub name: Arc<str>,
}

impl MemberKey {
    pub fn new(owner: TypeId, name: impl Into<Arc<str>>) -> Self {
        MemberKey {
            owner,
            name: name.into(),
        }
    }

    pub fn of<T: std::any::Any>(name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeId::of::<T>(), name)
    }
}

/// Kinds of up to three constructor arguments, the key of the constructor cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKinds {
    Zero,
    One(ValueKind),
    Two(ValueKind, ValueKind),
    Three(ValueKind, ValueKind, ValueKind),
}

impl ArgKinds {
    /// `None` when the arguments can't be cached: more than three of them, or a null.
    pub fn of(args: &[ConstValue]) -> Option<Self> {
        let kinds: Vec<_> = args.iter().map(ValueKind::of).collect();
        if kinds.contains(&ValueKind::Null) {
            return None;
        }
        Some(match kinds[..] {
            [] => ArgKinds::Zero,
            [a] => ArgKinds::One(a),
            [a, b] => ArgKinds::Two(a, b),
            [a, b, c] => ArgKinds::Three(a, b, c),
            _ => return None,
        })
    }

    fn kinds(self) -> Vec<ValueKind> {
        match self {
            ArgKinds::Zero => vec![],
            ArgKinds::One(a) => vec![a],
            ArgKinds::Two(a, b) => vec![a, b],
            ArgKinds::Three(a, b, c) => vec![a, b, c],
        }
    }
}

fn describe_kinds(kinds: &[ValueKind]) -> String {
    kinds.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn check_owner(owner: TypeId, owner_name: &'static str, actual: TypeId, actual_name: &'static str) -> Result<(), InvocationError> {
    if owner == actual {
        Ok(())
    } else {
        Err(InvocationError::SourceMismatch {
            expected: owner_name,
            actual: actual_name,
        })
    }
}

fn bind(params: &[Param], arguments: &Arguments) -> Result<Vec<ConstValue>, InvocationError> {
    params
        .iter()
        .map(|param| coerce(param, arguments.get(param.name).cloned().unwrap_or(ConstValue::Null)))
        .collect()
}

fn bind_positional(params: &[Param], args: Vec<ConstValue>) -> Result<Vec<ConstValue>, InvocationError> {
    params.iter().zip(args).map(|(param, arg)| coerce(param, arg)).collect()
}

pub struct PropertyThunk {
    key: MemberKey,
    owner_name: &'static str,
    get: Arc<PropertyFn>,
}

impl PropertyThunk {
    pub fn key(&self) -> &MemberKey {
        &self.key
    }

    pub fn get(&self, target: &HostObject) -> Result<HostValue, InvocationError> {
        check_owner(self.key.owner, self.owner_name, target.type_id(), target.type_name())?;
        (self.get)(target)
    }
}

pub struct MethodThunk {
    key: MemberKey,
    owner_name: &'static str,
    params: Arc<[Param]>,
    call: Arc<MethodFn>,
    asynchronous: bool,
}

impl MethodThunk {
    pub fn key(&self) -> &MemberKey {
        &self.key
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_async(&self) -> bool {
        self.asynchronous
    }

    /// Binds `arguments` to the parameters and calls the member. Synchronous
    /// members run when the returned future is first polled or earlier; the
    /// future never borrows `self`.
    pub fn invoke(&self, target: &HostObject, arguments: &Arguments) -> BoxFuture<'static, Result<HostValue, InvocationError>> {
        let args = check_owner(self.key.owner, self.owner_name, target.type_id(), target.type_name())
            .and_then(|()| bind(&self.params, arguments));
        match args {
            Ok(args) => (self.call)(target, args),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }
}

pub struct SetterThunk {
    key: MemberKey,
    owner_name: &'static str,
    param: Param,
    set: Arc<SetterFn>,
}

impl SetterThunk {
    pub fn key(&self) -> &MemberKey {
        &self.key
    }

    pub fn set(&self, instance: &mut HostInstance, value: ConstValue) -> Result<(), InvocationError> {
        check_owner(self.key.owner, self.owner_name, instance.type_id(), instance.type_name())?;
        let value = coerce(&self.param, value)?;
        (self.set)(instance, value)
    }
}

pub struct ConstructorThunk {
    owner: TypeId,
    owner_name: &'static str,
    params: Arc<[Param]>,
    construct: Arc<ConstructorFn>,
}

impl ConstructorThunk {
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn construct(&self, args: Vec<ConstValue>) -> Result<HostInstance, InvocationError> {
        if args.len() != self.params.len() {
            return Err(InvocationError::MissingConstructor {
                owner: self.owner_name,
                kinds: describe_kinds(&args.iter().map(ValueKind::of).collect::<Vec<_>>()),
            });
        }
        (self.construct)(bind_positional(&self.params, args)?)
    }
}

macro_rules! impl_debug {
    ($($thunk:ident),*) => {
        $(
            impl fmt::Debug for $thunk {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($thunk))
                        .field("owner", &self.owner_name)
                        .finish_non_exhaustive()
                }
            }
        )*
    };
}

impl_debug!(PropertyThunk, MethodThunk, SetterThunk, ConstructorThunk);

/// Compiled thunks for host members, built on first use and shared afterwards.
///
/// Every lookup of an already compiled key returns the same `Arc`. The
/// `*_dynamic` methods resolve the member by name on every call instead and
/// go through the same coercion, so both paths produce identical results.
pub struct InvocationCache {
    registry: Arc<HostRegistry>,
    properties: DashMap<MemberKey, Arc<PropertyThunk>>,
    methods: DashMap<MemberKey, Arc<MethodThunk>>,
    setters: DashMap<MemberKey, Arc<SetterThunk>>,
    constructors: DashMap<(TypeId, ArgKinds), Arc<ConstructorThunk>>,
}

fn get_or_compile<K, V>(
    map: &DashMap<K, Arc<V>>,
    key: &K,
    compile: impl FnOnce() -> Result<V, InvocationError>,
) -> Result<Arc<V>, InvocationError>
where
    K: Eq + Hash + Clone,
{
    if let Some(thunk) = map.get(key) {
        return Ok(Arc::clone(thunk.value()));
    }
    let thunk = Arc::new(compile()?);
    // A concurrent compilation may have won the race, keep its thunk.
    Ok(Arc::clone(map.entry(key.clone()).or_insert(thunk).value()))
}

impl InvocationCache {
    pub fn new(registry: Arc<HostRegistry>) -> Self {
        InvocationCache {
            registry,
            properties: DashMap::new(),
            methods: DashMap::new(),
            setters: DashMap::new(),
            constructors: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// Number of compiled thunks.
    pub fn len(&self) -> usize {
        self.properties.len() + self.methods.len() + self.setters.len() + self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn host_type(&self, type_id: TypeId) -> Result<&HostType, InvocationError> {
        self.registry
            .get(type_id)
            .ok_or_else(|| InvocationError::UnknownType(format!("{type_id:?}")))
    }

    fn member(&self, type_id: TypeId, name: &str) -> Result<(&HostType, &MemberKind), InvocationError> {
        let ty = self.host_type(type_id)?;
        let member = ty.member(name).ok_or_else(|| InvocationError::MissingMember {
            owner: ty.type_name(),
            member: name.to_string(),
        })?;
        Ok((ty, member))
    }

    fn missing(ty: &HostType, name: &str) -> InvocationError {
        InvocationError::MissingMember {
            owner: ty.type_name(),
            member: name.to_string(),
        }
    }

    pub fn property(&self, key: &MemberKey) -> Result<Arc<PropertyThunk>, InvocationError> {
        get_or_compile(&self.properties, key, || {
            let (ty, member) = self.member(key.owner, &key.name)?;
            let MemberKind::Property(get) = member else {
                return Err(Self::missing(ty, &key.name));
            };
            tracing::debug!(owner = ty.type_name(), member = %key.name, "compiled property thunk");
            Ok(PropertyThunk {
                key: key.clone(),
                owner_name: ty.type_name(),
                get: Arc::clone(get),
            })
        })
    }

    pub fn method(&self, key: &MemberKey) -> Result<Arc<MethodThunk>, InvocationError> {
        get_or_compile(&self.methods, key, || {
            let (ty, member) = self.member(key.owner, &key.name)?;
            let MemberKind::Method {
                params,
                call,
                asynchronous,
            } = member
            else {
                return Err(Self::missing(ty, &key.name));
            };
            tracing::debug!(owner = ty.type_name(), member = %key.name, "compiled method thunk");
            Ok(MethodThunk {
                key: key.clone(),
                owner_name: ty.type_name(),
                params: Arc::clone(params),
                call: Arc::clone(call),
                asynchronous: *asynchronous,
            })
        })
    }

    pub fn setter(&self, key: &MemberKey) -> Result<Arc<SetterThunk>, InvocationError> {
        get_or_compile(&self.setters, key, || {
            let (ty, member) = self.member(key.owner, &key.name)?;
            let MemberKind::Setter { param, set } = member else {
                return Err(Self::missing(ty, &key.name));
            };
            tracing::debug!(owner = ty.type_name(), member = %key.name, "compiled setter thunk");
            Ok(SetterThunk {
                key: key.clone(),
                owner_name: ty.type_name(),
                param: *param,
                set: Arc::clone(set),
            })
        })
    }

    /// Thunk for the first constructor of `type_id` accepting arguments of
    /// the given kinds.
    pub fn constructor(&self, type_id: TypeId, kinds: ArgKinds) -> Result<Arc<ConstructorThunk>, InvocationError> {
        get_or_compile(&self.constructors, &(type_id, kinds), || {
            let ty = self.host_type(type_id)?;
            let kinds = kinds.kinds();
            let entry = ty
                .constructor_for(&kinds)
                .ok_or_else(|| InvocationError::MissingConstructor {
                    owner: ty.type_name(),
                    kinds: describe_kinds(&kinds),
                })?;
            tracing::debug!(owner = ty.type_name(), arity = kinds.len(), "compiled constructor thunk");
            Ok(ConstructorThunk {
                owner: type_id,
                owner_name: ty.type_name(),
                params: Arc::clone(&entry.params),
                construct: Arc::clone(&entry.construct),
            })
        })
    }

    /// Constructs an instance of `type_id`, through the constructor cache when
    /// the arguments allow it.
    pub fn construct(&self, type_id: TypeId, args: Vec<ConstValue>) -> Result<HostInstance, InvocationError> {
        match ArgKinds::of(&args) {
            Some(kinds) => self.constructor(type_id, kinds)?.construct(args),
            None => self.construct_dynamic(type_id, args),
        }
    }

    pub fn get_dynamic(&self, target: &HostObject, name: &str) -> Result<HostValue, InvocationError> {
        let (ty, member) = self.member(target.type_id(), name)?;
        match member {
            MemberKind::Property(get) => get(target),
            _ => Err(Self::missing(ty, name)),
        }
    }

    pub fn invoke_dynamic(
        &self,
        target: &HostObject,
        name: &str,
        arguments: &Arguments,
    ) -> BoxFuture<'static, Result<HostValue, InvocationError>> {
        let prepared = self.member(target.type_id(), name).and_then(|(ty, member)| match member {
            MemberKind::Method { params, call, .. } => Ok((Arc::clone(call), bind(params, arguments)?)),
            _ => Err(Self::missing(ty, name)),
        });
        match prepared {
            Ok((call, args)) => call(target, args),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }

    pub fn set_dynamic(&self, instance: &mut HostInstance, name: &str, value: ConstValue) -> Result<(), InvocationError> {
        let (ty, member) = self.member(instance.type_id(), name)?;
        match member {
            MemberKind::Setter { param, set } => set(instance, coerce(param, value)?),
            _ => Err(Self::missing(ty, name)),
        }
    }

    pub fn construct_dynamic(&self, type_id: TypeId, args: Vec<ConstValue>) -> Result<HostInstance, InvocationError> {
        let ty = self.host_type(type_id)?;
        let kinds: Vec<_> = args.iter().map(ValueKind::of).collect();
        let entry = ty
            .constructor_for(&kinds)
            .ok_or_else(|| InvocationError::MissingConstructor {
                owner: ty.type_name(),
                kinds: describe_kinds(&kinds),
            })?;
        (entry.construct)(bind_positional(&entry.params, args)?)
    }
}

impl fmt::Debug for InvocationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationCache")
            .field("registry", &self.registry)
            .field("compiled", &self.len())
            .finish()
    }
}
