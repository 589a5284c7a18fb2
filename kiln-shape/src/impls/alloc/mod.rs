mod arc;
mod boxed;
mod btreemap;
mod rc;
mod string;
mod vec;
mod vec_deque;
