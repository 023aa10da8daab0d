//! Tablet core structure
//! Tablet 核心结构

use std::{path::PathBuf, rc::Rc};

use log::{debug, info};
use tdb_cache::BlockCache;
use tdb_cell::{CellBuffer, CellKey, IntervalSet, ScanPredicate};
use tdb_commit::CommitRing;
use tdb_frag::{DEFAULT_BLOCK_SIZE, DiskFrag, Frag, FragMeta, LogFrag};
use tdb_merge::{CompactKind, Compactor};
use tdb_wal::LogWriter;

use crate::{
  FileConfig, FragRemover, FragWriterFactory, Result, Scanner, SwitchedLoader, TabletConfig,
  replay::replay_dir,
};

const FRAG_DIR: &str = "frag";
const WAL_DIR: &str = "wal";
const CONFIG_FILE: &str = "config";

/// Tablet configuration
/// Tablet 配置
#[derive(Debug, Clone, Copy)]
pub enum Conf {
  /// Fragment block size (bytes), default 64KB
  /// 分片块大小（字节），默认 64KB
  BlockSize(usize),
  /// Weak block cache sweep watermark, default 1024
  /// 弱块缓存清扫水位，默认 1024
  CacheWatermark(usize),
  /// Commit ring purge threshold (bytes), default 1MB
  /// 提交环清理阈值（字节），默认 1MB
  PurgeThreshold(usize),
}

/// One tablet: an in-memory log fragment in front of immutable disk
/// fragments, a WAL for durability, and a commit ring for replay
/// dedup. The fragment list is copy-on-write: every scan snapshots an
/// `Rc` of the current list, and flush/compaction publish a fresh list
/// instead of mutating the shared one.
/// 单个 tablet：内存日志分片在前，不可变磁盘分片在后，WAL 保障持久性，
/// 提交环用于重放去重。分片列表写时复制：每个扫描快照当前列表的 `Rc`，
/// 刷盘与压缩发布新列表而非改动共享列表。
pub struct Tablet {
  name: Box<[u8]>,
  wal_dir: PathBuf,
  cache: Rc<BlockCache>,
  /// Newest first; index 0 is the live log fragment
  /// 最新在前；下标 0 是活跃日志分片
  frags: Rc<Vec<Frag>>,
  log: LogFrag,
  wal: LogWriter,
  ring: CommitRing,
  config: FileConfig,
  factory: FragWriterFactory,
  loader: SwitchedLoader,
  remover: FragRemover,
  /// Replaced disk fragments awaiting no-reader before file removal
  /// 等待无读者后删除文件的被替换磁盘分片
  gc: Vec<Rc<DiskFrag>>,
  last_txn: i64,
}

impl Tablet {
  /// Open a tablet directory with the local-disk loader; fragments
  /// saved under other uri schemes need [`Tablet::open_with`]
  /// 以本地磁盘加载器打开 tablet 目录；以其他 uri 方案保存的分片需用
  /// [`Tablet::open_with`]
  pub async fn open(
    dir: impl Into<PathBuf>,
    name: impl Into<Box<[u8]>>,
    conf: &[Conf],
  ) -> Result<Self> {
    Self::open_with(dir, name, conf, SwitchedLoader::local()).await
  }

  /// Open with a caller-built scheme registry: the saved fragment list
  /// resolves through `loader`, so every scheme it was persisted with
  /// must already be registered
  /// 以调用方构建的方案注册表打开：保存的分片列表经 `loader` 解析，持久化
  /// 时用到的每个方案须已注册
  pub async fn open_with(
    dir: impl Into<PathBuf>,
    name: impl Into<Box<[u8]>>,
    conf: &[Conf],
    loader: SwitchedLoader,
  ) -> Result<Self> {
    let dir = dir.into();
    let name = name.into();

    let mut block_size = DEFAULT_BLOCK_SIZE;
    let mut watermark = tdb_cache::DEFAULT_WATERMARK;
    let mut purge_threshold = tdb_commit::DEFAULT_PURGE;
    for c in conf {
      match c {
        Conf::BlockSize(v) => block_size = *v,
        Conf::CacheWatermark(v) => watermark = *v,
        Conf::PurgeThreshold(v) => purge_threshold = *v,
      }
    }

    let wal_dir = dir.join(WAL_DIR);
    std::fs::create_dir_all(&wal_dir)?;
    let factory = FragWriterFactory::open(dir.join(FRAG_DIR), block_size)?;
    let config = FileConfig::new(dir.join(CONFIG_FILE));

    let saved = config.load()?;
    let mut ring = CommitRing::new(saved.last_txn, purge_threshold);

    let mut frags = Vec::with_capacity(saved.frags.len() + 1);
    let log = LogFrag::new();
    frags.push(Frag::Log(log.clone()));
    for uri in &saved.frags {
      frags.push(loader.load(uri, None).await?);
    }

    let last_txn = replay_dir(&wal_dir, &name, &mut ring, &log).await?;
    let wal = LogWriter::create(wal_dir.join(last_txn.to_string())).await?;
    info!(
      "tablet open: {} disk frags, {} replayed cells, txn {}",
      saved.frags.len(),
      log.cell_count(),
      last_txn
    );

    Ok(Self {
      name,
      wal_dir,
      cache: Rc::new(BlockCache::weak(watermark)),
      frags: Rc::new(frags),
      log,
      wal,
      ring,
      config,
      factory,
      loader,
      remover: FragRemover,
      gc: Vec::new(),
      last_txn,
    })
  }

  /// Apply one packed mutation batch: append to the WAL, record the
  /// commit, make it visible in the log fragment. Durable only after
  /// `sync`.
  /// 应用一个打包变更批次：追加 WAL、记录提交、在日志分片中可见。`sync`
  /// 后才持久。
  pub fn apply(&mut self, packed: &[u8]) -> Result<i64> {
    let buffer = CellBuffer::decode(packed)?;
    let txn = self.last_txn + 1;

    self.wal.write_cells(&self.name, packed)?;
    for row in buffer.rows() {
      self.ring.set_commit(&row, txn)?;
    }
    self.log.apply(buffer.cells());
    self.last_txn = txn;
    Ok(txn)
  }

  /// Force applied batches to disk
  /// 强制已应用批次落盘
  pub async fn sync(&mut self) -> Result<()> {
    self.wal.sync().await?;
    Ok(())
  }

  /// Snapshot scan; the returned scanner outlives any later list swap
  /// 快照扫描；返回的扫描器不受之后列表切换影响
  pub fn scan(&self, pred: ScanPredicate) -> Scanner {
    self.resume(pred, None)
  }

  /// Scan resuming strictly after `cursor`
  /// 从 `cursor` 之后严格恢复的扫描
  pub fn resume(&self, pred: ScanPredicate, cursor: Option<CellKey>) -> Scanner {
    Scanner::new(self.frags.clone(), self.cache.clone(), pred, cursor)
  }

  /// Write the log fragment out as a disk fragment, publish the new
  /// list, then retire WAL files made redundant by it
  /// 将日志分片写成磁盘分片并发布新列表，然后退役由此冗余的 WAL 文件
  pub async fn flush(&mut self) -> Result<Option<FragMeta>> {
    if self.log.is_empty() {
      return Ok(None);
    }

    let mut writer = self.factory.start().await?;
    for cell in self.log.cells() {
      writer.put(&cell).await?;
    }
    let meta = writer.finish().await?;
    let disk = Rc::new(DiskFrag::open(&meta.path, None).await?);

    let log = LogFrag::new();
    let mut frags = Vec::with_capacity(self.frags.len() + 1);
    frags.push(Frag::Log(log.clone()));
    frags.push(Frag::Disk(disk));
    frags.extend(self.frags[1..].iter().cloned());
    self.publish(frags).await?;
    self.log = log;

    // All prior batches are now durable in the fragment
    // 之前的所有批次已持久于分片中
    let keep = self.last_txn.to_string();
    let old = std::mem::replace(
      &mut self.wal,
      LogWriter::create(self.wal_dir.join(&keep)).await?,
    );
    old.finish().await?;
    for entry in std::fs::read_dir(&self.wal_dir)? {
      let path = entry?.path();
      if path.file_name() != Some(std::ffi::OsStr::new(&keep)) {
        self.remover.remove(&path);
      }
    }

    debug!("flushed {} cells to {}", meta.cell_count, meta.path.display());
    Ok(Some(meta))
  }

  /// Fold the `n` oldest disk fragments into one and swap it in. Old
  /// files are removed once no scanner references them. `Full` is only
  /// safe when the set spans every fragment that may hold matching
  /// older versions; picking the kind is the caller's policy.
  /// 将最旧的 `n` 个磁盘分片折叠为一个并换入。旧文件在无扫描器引用后删除。
  /// 仅当集合覆盖所有可能含较旧匹配版本的分片时 `Full` 才安全；选择方式是
  /// 调用方的策略。
  pub async fn compact(&mut self, n: usize, kind: CompactKind) -> Result<Option<FragMeta>> {
    let disks = self.frags.len() - 1;
    let n = n.min(disks);
    if n < 2 {
      return Ok(None);
    }

    let keep = self.frags.len() - n;
    let set: Vec<Frag> = self.frags[keep..].to_vec();
    let writer = self.factory.start().await?;
    let meta = Compactor::new(self.cache.clone())
      .compact(&set, writer, kind)
      .await?;
    let disk = Rc::new(DiskFrag::open(&meta.path, None).await?);

    let mut frags: Vec<Frag> = self.frags[..keep].to_vec();
    frags.push(Frag::Disk(disk));
    self.publish(frags).await?;

    for frag in set {
      if let Frag::Disk(d) = frag {
        self.gc.push(d);
      }
    }
    self.collect_garbage();
    Ok(Some(meta))
  }

  /// Swap in a new fragment list and persist it
  /// 换入新分片列表并持久化
  async fn publish(&mut self, frags: Vec<Frag>) -> Result<()> {
    let uris: Vec<String> = frags[1..]
      .iter()
      .filter_map(|f| f.as_disk().map(|d| FragWriterFactory::uri(d.path())))
      .collect();
    self
      .config
      .save(&TabletConfig {
        frags: uris,
        last_txn: self.last_txn,
      })
      .await?;
    self.frags = Rc::new(frags);
    Ok(())
  }

  /// Remove retired fragment files that no reader holds anymore
  /// 删除不再被任何读者持有的已退役分片文件
  pub fn collect_garbage(&mut self) {
    self.gc.retain(|d| {
      if Rc::strong_count(d) > 1 {
        true
      } else {
        self.remover.remove(d.path());
        false
      }
    });
  }

  /// Pending retired fragments still referenced by readers
  /// 仍被读者引用的待删除已退役分片数
  #[inline]
  pub fn gc_pending(&self) -> usize {
    self.gc.len()
  }

  #[inline]
  pub fn name(&self) -> &[u8] {
    &self.name
  }

  #[inline]
  pub fn last_txn(&self) -> i64 {
    self.last_txn
  }

  #[inline]
  pub fn frag_count(&self) -> usize {
    self.frags.len()
  }

  #[inline]
  pub fn log_size(&self) -> usize {
    self.log.size()
  }

  #[inline]
  pub fn cache(&self) -> &Rc<BlockCache> {
    &self.cache
  }

  #[inline]
  pub fn ring(&self) -> &CommitRing {
    &self.ring
  }

  /// Bytes of disk data overlapping `rows`, all fragments combined
  /// 与 `rows` 重叠的磁盘数据字节数，所有分片合计
  pub fn disk_size(&self, rows: Option<&IntervalSet<Box<[u8]>>>) -> u64 {
    self.frags.iter().map(|f| f.disk_size(rows)).sum()
  }

  /// Registered loader schemes are an open set; external storage adds
  /// its own
  /// 已注册加载器方案是开放集合；外部存储可自行添加
  pub fn loader_mut(&mut self) -> &mut SwitchedLoader {
    &mut self.loader
  }
}
