//! Fragment loaders: uri scheme registry and weak reopen cache
//! 分片加载器：uri 方案注册表与弱引用重开缓存

use std::{
  cell::RefCell,
  collections::HashMap,
  rc::{Rc, Weak},
};

use tdb_frag::{DiskFrag, Frag};

use crate::{Error, Result};

/// Column-family restriction passed through to the fragment
/// 透传给分片的列族限制
pub type Families = Option<Vec<Box<[u8]>>>;

/// Resolves a fragment uri to a live fragment. How uris map to storage
/// is this layer's business, not the tablet's.
/// 将分片 uri 解析为可用分片。uri 如何映射到存储由本层负责，与 tablet 无关。
#[derive(Debug)]
pub enum Loader {
  Disk(DiskLoader),
  Cached(CachedLoader),
}

impl Loader {
  pub async fn load(&self, uri: &str, families: Families) -> Result<Frag> {
    match self {
      Loader::Disk(l) => l.load(uri, families).await,
      Loader::Cached(l) => l.load(uri, families).await,
    }
  }
}

impl From<DiskLoader> for Loader {
  fn from(l: DiskLoader) -> Self {
    Loader::Disk(l)
  }
}

impl From<CachedLoader> for Loader {
  fn from(l: CachedLoader) -> Self {
    Loader::Cached(l)
  }
}

/// Opens local disk fragment files; the uri tail is a filesystem path
/// 打开本地磁盘分片文件；uri 尾部即文件系统路径
#[derive(Debug, Default)]
pub struct DiskLoader;

impl DiskLoader {
  pub async fn load(&self, path: &str, families: Families) -> Result<Frag> {
    Ok(DiskFrag::open(path, families).await?.into())
  }
}

/// Weak cache over [`DiskLoader`]. A fragment opened twice with no
/// family restriction resolves to the same instance while anyone still
/// holds it; dead entries are swept once the index outgrows its
/// watermark. Restricted loads bypass the cache, their views differ
/// per caller.
/// [`DiskLoader`] 之上的弱缓存。无列族限制时同一分片两次打开解析为同一实例
/// （只要仍有人持有）；索引超出水位后清扫失效条目。受限加载绕过缓存，其视图
/// 因调用方而异。
#[derive(Debug)]
pub struct CachedLoader {
  inner: DiskLoader,
  index: RefCell<HashMap<String, Weak<DiskFrag>>>,
  watermark: usize,
}

impl CachedLoader {
  pub fn new(watermark: usize) -> Self {
    Self {
      inner: DiskLoader,
      index: RefCell::new(HashMap::new()),
      watermark: watermark.max(1),
    }
  }

  pub async fn load(&self, path: &str, families: Families) -> Result<Frag> {
    if families.is_some() {
      return self.inner.load(path, families).await;
    }

    if let Some(frag) = self.index.borrow().get(path).and_then(Weak::upgrade) {
      return Ok(Frag::Disk(frag));
    }

    // Not holding the borrow across the load
    // 加载期间不持有借用
    let disk = Rc::new(DiskFrag::open(path, None).await?);
    let mut index = self.index.borrow_mut();
    index.insert(path.to_string(), Rc::downgrade(&disk));
    if index.len() > self.watermark {
      index.retain(|_, w| w.strong_count() > 0);
    }
    Ok(Frag::Disk(disk))
  }

  #[inline]
  pub fn index_len(&self) -> usize {
    self.index.borrow().len()
  }
}

/// Scheme registry: "<scheme>:<rest>" routes to the loader registered
/// for the scheme. An unregistered scheme is a value error naming the
/// full uri.
/// 方案注册表："<scheme>:<rest>" 路由到该方案注册的加载器。未注册方案是
/// 指明完整 uri 的值错误。
#[derive(Debug, Default)]
pub struct SwitchedLoader {
  map: HashMap<String, Loader>,
}

impl SwitchedLoader {
  pub fn new() -> Self {
    Self {
      map: HashMap::new(),
    }
  }

  /// Registry with "disk" bound to the local file loader
  /// 已将 "disk" 绑定到本地文件加载器的注册表
  pub fn local() -> Self {
    let mut s = Self::new();
    s.set("disk", DiskLoader);
    s
  }

  pub fn set(&mut self, scheme: impl Into<String>, loader: impl Into<Loader>) -> &mut Self {
    self.map.insert(scheme.into(), loader.into());
    self
  }

  pub async fn load(&self, uri: &str, families: Families) -> Result<Frag> {
    let (scheme, rest) = uri.split_once(':').unwrap_or(("", uri));
    match self.map.get(scheme) {
      Some(l) => l.load(rest, families).await,
      None => Err(Error::UnknownScheme {
        uri: uri.to_string(),
      }),
    }
  }
}
