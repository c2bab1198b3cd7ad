pub mod a001_fetch_task;
