use std::collections::BTreeMap;
use std::path::Path;

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvFlags, EnvOpenOptions, RoTxn, RwTxn, WithTls};
use log::{debug, info};

pub mod model;

pub use model::*;

use crate::error::{Error, Result};
use crate::metrics;

/// 存放图片记录的集合名
pub const IMAGE_COLLECTION: &str = "image";

/// 图片元数据仓库
///
/// 单个 LMDB 文件，单写多读；所有读写都在事务中完成。
/// `Env` 内部是引用计数的，因此 clone 的开销很小，可以直接移动到阻塞线程池中使用
#[derive(Clone)]
pub struct ImageStore {
    env: Env<WithTls>,
    images: Database<Str, Bytes>,
}

impl ImageStore {
    /// 打开或创建数据库文件，并确保图片集合存在
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("打开数据库: {}", path.display());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(heed::Error::Io)?;
            }
        }

        let env = unsafe {
            EnvOpenOptions::new()
                // 元数据体积很小，1GiB 足够
                .map_size(1 << 30)
                .max_dbs(4)
                .flags(EnvFlags::NO_SUB_DIR)
                .open(path)?
        };
        let images = Self::ensure_collection(&env, IMAGE_COLLECTION)?;
        Ok(Self { env, images })
    }

    /// 创建指定名称的集合，已存在时直接返回
    pub fn ensure_collection(env: &Env<WithTls>, name: &str) -> Result<Database<Str, Bytes>> {
        let mut txn = env.write_txn()?;
        let db = env.create_database::<Str, Bytes>(&mut txn, Some(name))?;
        txn.commit()?;
        debug!("集合已就绪: {name}");
        Ok(db)
    }

    /// 在只读事务中执行 `f`，返回时事务自动释放
    fn read<T>(&self, f: impl FnOnce(&RoTxn<'_, WithTls>) -> Result<T>) -> Result<T> {
        let txn = self.env.read_txn()?;
        f(&txn)
    }

    /// 在读写事务中执行 `f`，仅当 `f` 成功时提交
    ///
    /// 出错或提前返回时事务随 drop 回滚，不会留下部分写入
    fn write<T>(&self, f: impl FnOnce(&mut RwTxn<'_>) -> Result<T>) -> Result<T> {
        let mut txn = self.env.write_txn()?;
        let value = f(&mut txn)?;
        txn.commit()?;
        Ok(value)
    }

    /// 按 key 字节序返回前 `max` 条记录
    ///
    /// 任一条记录解码失败时整个调用失败，不返回部分结果
    pub fn list_first(&self, max: usize) -> Result<BTreeMap<String, ImageRecord>> {
        metrics::inc_store_op("list");
        self.read(|txn| {
            let mut records = BTreeMap::new();
            for item in self.images.iter(txn)?.take(max) {
                let (id, value) = item?;
                records.insert(id.to_owned(), ImageRecord::decode(value)?);
            }
            Ok(records)
        })
    }

    /// 读取单条记录的原始编码
    pub fn get_one(&self, id: &str) -> Result<Vec<u8>> {
        metrics::inc_store_op("get");
        self.read(|txn| match self.images.get(txn, id)? {
            Some(value) => Ok(value.to_vec()),
            None => Err(Error::NotFound(id.to_owned())),
        })
    }

    /// 写入记录并返回写入的字节
    ///
    /// NOTE: 这里不检查 ID 是否已存在，重复 ID 会直接覆盖，唯一性由 UUID 保证
    pub fn create(&self, record: &ImageRecord) -> Result<Vec<u8>> {
        metrics::inc_store_op("create");
        self.write(|txn| {
            let bytes = record.encode()?;
            self.images.put(txn, &record.id, &bytes)?;
            Ok(bytes)
        })
    }

    /// 删除记录，key 不存在时同样视为成功
    ///
    /// 返回只包含 ID 的确认记录，而不是被删除记录的原值
    pub fn delete(&self, id: &str) -> Result<Vec<u8>> {
        metrics::inc_store_op("delete");
        let existed = self.write(|txn| Ok(self.images.delete(txn, id)?))?;
        debug!("删除记录 {id}: existed={existed}");
        Ok(ImageRecord::acknowledge(id).encode()?)
    }

    /// 当前记录总数
    pub fn len(&self) -> Result<u64> {
        self.read(|txn| Ok(self.images.len(txn)?))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// 以只读方式打开已存在的数据库，任何写事务都会失败
    ///
    /// 仅用于测试提交失败的处理
    #[cfg(test)]
    pub(crate) fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(1 << 30)
                .max_dbs(4)
                .flags(EnvFlags::NO_SUB_DIR | EnvFlags::READ_ONLY)
                .open(path)?
        };
        let txn = env.read_txn()?;
        let images = env
            .open_database::<Str, Bytes>(&txn, Some(IMAGE_COLLECTION))?
            .ok_or_else(|| Error::NotFound(IMAGE_COLLECTION.to_owned()))?;
        txn.commit()?;
        Ok(Self { env, images })
    }

    /// 直接写入原始字节，仅用于测试损坏数据的处理
    #[cfg(test)]
    fn put_raw(&self, id: &str, value: &[u8]) -> Result<()> {
        self.write(|txn| Ok(self.images.put(txn, id, value)?))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::error::StoreError;

    fn record(id: &str, created: i64) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            sentiment: 0.25,
            brightness: 100.0,
            tone: 42.0,
            created,
            image_url: format!("https://cdn.example/{id}.png"),
        }
    }

    #[test]
    fn test_create_and_get() {
        let dir = tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("main.db")).unwrap();

        let written = store.create(&record("a", 1)).unwrap();
        let raw = store.get_one("a").unwrap();
        assert_eq!(written, raw);
        assert_eq!(ImageRecord::decode(&raw).unwrap(), record("a", 1));
    }

    #[test]
    fn test_get_missing() {
        let dir = tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("main.db")).unwrap();
        assert!(matches!(store.get_one("nope"), Err(Error::NotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_create_overwrites() {
        let dir = tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("main.db")).unwrap();
        store.create(&record("a", 1)).unwrap();
        store.create(&record("a", 2)).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        let got = ImageRecord::decode(&store.get_one("a").unwrap()).unwrap();
        assert_eq!(got.created, 2);
    }

    #[test]
    fn test_list_first_bound_and_order() {
        let dir = tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("main.db")).unwrap();
        // 插入顺序与 key 顺序相反
        for (i, id) in ["e", "d", "c", "b", "a"].iter().enumerate() {
            store.create(&record(id, i as i64 + 1)).unwrap();
        }

        let listed = store.list_first(3).unwrap();
        assert_eq!(listed.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(store.list_first(100).unwrap().len(), 5);
        assert!(store.list_first(0).unwrap().is_empty());
    }

    #[test]
    fn test_list_decode_error_aborts() {
        let dir = tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("main.db")).unwrap();
        store.create(&record("a", 1)).unwrap();
        store.put_raw("b", b"\xff\x00").unwrap();

        assert!(matches!(store.list_first(10), Err(Error::Store(StoreError::Decode(_)))));
        // 损坏记录在上限之外时不会被读取
        assert_eq!(store.list_first(1).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_idempotent() {
        let dir = tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("main.db")).unwrap();
        store.create(&record("a", 1)).unwrap();

        for _ in 0..2 {
            let ack = ImageRecord::decode(&store.delete("a").unwrap()).unwrap();
            assert_eq!(ack, ImageRecord::acknowledge("a"));
        }
        assert!(store.is_empty().unwrap());
        assert!(matches!(store.get_one("a"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("main.db")).unwrap();
        let result: Result<()> = store.write(|txn| {
            store.images.put(txn, "half", b"{}")?;
            Err(Error::Validation("中途失败".into()))
        });
        assert!(result.is_err());
        assert!(matches!(store.get_one("half"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("main.db");
        {
            let store = ImageStore::open(&path).unwrap();
            store.create(&record("a", 1)).unwrap();
        }
        let store = ImageStore::open(&path).unwrap();
        assert_eq!(store.list_first(40).unwrap()["a"], record("a", 1));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.db");
        {
            let store = ImageStore::open(&path).unwrap();
            store.create(&record("a", 1)).unwrap();
        }
        let store = ImageStore::open_read_only(&path).unwrap();
        assert!(matches!(store.create(&record("b", 2)), Err(Error::Store(StoreError::Heed(_)))));
        assert_eq!(store.list_first(40).unwrap().keys().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn test_snapshot_isolation() {
        let dir = tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("main.db")).unwrap();
        store.create(&record("a", 1)).unwrap();

        let txn = store.env.read_txn().unwrap();
        // LMDB 不允许同一线程同时持有读写事务，写入放到另一个线程
        std::thread::scope(|s| {
            s.spawn(|| store.create(&record("b", 2)).unwrap());
        });
        // 旧快照看不到新写入
        assert_eq!(store.images.len(&txn).unwrap(), 1);
        drop(txn);
        assert_eq!(store.len().unwrap(), 2);
    }
}
