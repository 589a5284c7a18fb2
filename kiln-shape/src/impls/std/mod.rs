mod hashmap;
mod once_lock;
