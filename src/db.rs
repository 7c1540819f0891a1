//! LMDB environment, tables and transaction helpers

use std::fs;

use byteorder::{BigEndian, ByteOrder};
use heed::types::{Bytes, SerdeJson, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};

use crate::config::Config;
use crate::constants::{GROUPS, META, NAMES, ROLES, ROLE_USERS, USERS, USER_ROLES};
use crate::error::Result;
use crate::model::{Group, Role, User};
use crate::tx::Tx;

type Id = U64<BigEndian>;
pub(crate) type Pair = Database<Bytes, Id>;
pub(crate) type Index = Database<Str, Id>;

/// Create a 16-byte key from two u64 values
#[inline]
pub(crate) fn key(a: u64, b: u64) -> [u8; 16] {
    let mut k = [0u8; 16];
    BigEndian::write_u64(&mut k[..8], a);
    BigEndian::write_u64(&mut k[8..], b);
    k
}

/// Bidirectional index: fwd[a,b] and rev[b,a] stay in sync
#[derive(Clone)]
pub(crate) struct BiPair {
    pub fwd: Pair,
    pub rev: Pair,
}

impl BiPair {
    #[inline]
    pub fn get(&self, tx: &RoTxn, a: u64, b: u64) -> Result<Option<u64>> {
        Ok(self.fwd.get(tx, &key(a, b))?)
    }

    #[inline]
    pub fn put(&self, tx: &mut RwTxn, a: u64, b: u64, v: u64) -> Result<()> {
        self.fwd.put(tx, &key(a, b), &v)?;
        Ok(self.rev.put(tx, &key(b, a), &v)?)
    }

    #[inline]
    pub fn del(&self, tx: &mut RwTxn, a: u64, b: u64) -> Result<bool> {
        let r = self.fwd.delete(tx, &key(a, b))?;
        self.rev.delete(tx, &key(b, a))?;
        Ok(r)
    }

    pub fn list_fwd(&self, tx: &RoTxn, a: u64) -> Result<Vec<(u64, u64)>> {
        Self::list_pfx(tx, &self.fwd, a)
    }

    pub fn list_rev(&self, tx: &RoTxn, b: u64) -> Result<Vec<(u64, u64)>> {
        Self::list_pfx(tx, &self.rev, b)
    }

    fn list_pfx(tx: &RoTxn, db: &Pair, pfx: u64) -> Result<Vec<(u64, u64)>> {
        let mut r = Vec::new();
        for item in db.prefix_iter(tx, &pfx.to_be_bytes())? {
            let (k, v) = item?;
            if k.len() == 16 {
                r.push((BigEndian::read_u64(&k[8..16]), v));
            }
        }
        Ok(r)
    }

    fn clear(&self, tx: &mut RwTxn) -> Result<()> {
        self.fwd.clear(tx)?;
        Ok(self.rev.clear(tx)?)
    }
}

#[derive(Clone)]
pub(crate) struct Dbs {
    pub users: Database<Id, SerdeJson<User>>,
    pub roles: Database<Id, SerdeJson<Role>>,
    pub groups: Database<Id, SerdeJson<Group>>,
    /// user → role, value is the grant time
    pub user_roles: BiPair,
    /// Unique keys (email, username, group and role names) → id
    pub names: Index,
    pub meta: Index,
}

/// Handle to an open RBAC database.
#[derive(Clone)]
pub struct Store {
    pub(crate) env: Env,
    pub(crate) dbs: Dbs,
}

impl Store {
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(config.map_size)
                .max_dbs(config.max_dbs)
                .open(&config.path)?
        };
        let mut tx = env.write_txn()?;
        let dbs = Dbs {
            users: env.create_database(&mut tx, Some(USERS))?,
            roles: env.create_database(&mut tx, Some(ROLES))?,
            groups: env.create_database(&mut tx, Some(GROUPS))?,
            user_roles: BiPair {
                fwd: env.create_database(&mut tx, Some(USER_ROLES))?,
                rev: env.create_database(&mut tx, Some(ROLE_USERS))?,
            },
            names: env.create_database(&mut tx, Some(NAMES))?,
            meta: env.create_database(&mut tx, Some(META))?,
        };
        tx.commit()?;
        tracing::debug!(path = %config.path.display(), "opened store");
        Ok(Store { env, dbs })
    }

    pub(crate) fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        let tx = self.env.read_txn()?;
        f(&self.dbs, &tx)
    }

    /// Run `f` in a single write transaction. Commits on `Ok`, aborts on `Err`.
    pub fn transact<T, F: FnOnce(&mut Tx<'_>) -> Result<T>>(&self, f: F) -> Result<T> {
        let mut tx = Tx::new(self.env.write_txn()?, &self.dbs);
        let r = f(&mut tx)?;
        tx.commit()?;
        Ok(r)
    }

    /// Remove every user, role, group and association.
    pub fn clear_all(&self) -> Result<()> {
        let mut tx = self.env.write_txn()?;
        let d = &self.dbs;
        d.users.clear(&mut tx)?;
        d.roles.clear(&mut tx)?;
        d.groups.clear(&mut tx)?;
        d.user_roles.clear(&mut tx)?;
        d.names.clear(&mut tx)?;
        d.meta.clear(&mut tx)?;
        Ok(tx.commit()?)
    }
}
